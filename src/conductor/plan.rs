//! Plan step splitting
//!
//! Supervised runs hand the conductor a markdown plan; a deterministic
//! splitter turns its `##` / `###` headers into steps. A section with
//! sub-headers is flattened into one step per sub-header.

/// One executable step of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub title: String,
    pub content: String,
}

/// Split plan markdown into steps on `##` and `###` headers
pub fn split_plan(markdown: &str) -> Vec<PlanStep> {
    let mut steps = Vec::new();

    // (title, content) of the open section and the open sub-section
    let mut section: Option<(String, String)> = None;
    let mut sub: Option<(String, String)> = None;
    let mut section_had_subs = false;

    let flush_sub = |sub: &mut Option<(String, String)>, steps: &mut Vec<PlanStep>| {
        if let Some((title, content)) = sub.take() {
            steps.push(PlanStep {
                title,
                content: content.trim().to_string(),
            });
        }
    };

    for line in markdown.lines() {
        if let Some(title) = line.strip_prefix("### ") {
            flush_sub(&mut sub, &mut steps);
            section_had_subs = true;
            sub = Some((title.trim().to_string(), String::new()));
        } else if let Some(title) = line.strip_prefix("## ") {
            flush_sub(&mut sub, &mut steps);
            if let Some((sec_title, sec_content)) = section.take()
                && !section_had_subs
            {
                steps.push(PlanStep {
                    title: sec_title,
                    content: sec_content.trim().to_string(),
                });
            }
            section = Some((title.trim().to_string(), String::new()));
            section_had_subs = false;
        } else if let Some((_, content)) = sub.as_mut() {
            content.push_str(line);
            content.push('\n');
        } else if let Some((_, content)) = section.as_mut() {
            content.push_str(line);
            content.push('\n');
        }
    }

    flush_sub(&mut sub, &mut steps);
    if let Some((title, content)) = section.take()
        && !section_had_subs
    {
        steps.push(PlanStep {
            title,
            content: content.trim().to_string(),
        });
    }

    // A plan with no headers is one step
    if steps.is_empty() && !markdown.trim().is_empty() {
        steps.push(PlanStep {
            title: "Plan".to_string(),
            content: markdown.trim().to_string(),
        });
    }

    steps
}
