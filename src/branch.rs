use crate::model::story::Story;

const SLUG_LIMIT: usize = 40;

pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed: String = slug.trim_matches('-').chars().take(SLUG_LIMIT).collect();
    trimmed.trim_end_matches('-').to_string()
}

/// Feature branch for a story: `<id>-<slug>`, or just `<id>` for titles with
/// nothing sluggable.
pub fn branch_name(story: &Story) -> String {
    let slug = slugify(&story.name);
    if slug.is_empty() {
        story.id.to_string()
    } else {
        format!("{}-{slug}", story.id)
    }
}

/// Recovers the story id from a feature branch name.
pub fn story_id_from_branch(branch: &str) -> Option<u64> {
    let digits_end = branch
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(branch.len());
    if digits_end == 0 {
        return None;
    }
    let rest = &branch[digits_end..];
    if !rest.is_empty() && !rest.starts_with('-') {
        return None;
    }
    branch[..digits_end].parse().ok()
}

pub fn is_feature_branch(branch: &str) -> bool {
    story_id_from_branch(branch).is_some()
}
