//! Script text rendering.

use kitchen_script::application::query_handlers::SectionView;

const DELIMITER: &str = "---\n\n";

/// The detailed script: title, description, then every section under a
/// numbered heading with its image instruction, each closed by `---`.
#[must_use]
pub fn render_detailed(title: &str, description: &str, sections: &[SectionView]) -> String {
    let mut script = format!("# {title}\n\n");
    if !description.is_empty() {
        script.push_str(description);
        script.push_str("\n\n");
    }
    script.push_str(DELIMITER);

    for (index, section) in sections.iter().enumerate() {
        script.push_str(&format!("## Section {}\n\n", index + 1));
        script.push_str(&section.content);
        script.push_str("\n\n");
        if !section.image_instruction.is_empty() {
            script.push_str(&format!(
                "**Image instruction**: {}\n\n",
                section.image_instruction
            ));
        }
        script.push_str(DELIMITER);
    }
    script
}

/// Body text only: section contents joined by one blank line, blank
/// sections dropped.
#[must_use]
pub fn render_plain(sections: &[SectionView]) -> String {
    sections
        .iter()
        .map(|s| s.content.as_str())
        .filter(|content| !content.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use kitchen_test_support::fixed_now;
    use uuid::Uuid;

    use super::*;

    fn section(order_index: usize, content: &str, instruction: &str) -> SectionView {
        SectionView {
            section_id: Uuid::new_v4(),
            project_id: Uuid::nil(),
            order_index,
            content: content.to_owned(),
            image_instruction: instruction.to_owned(),
            reference_image_urls: None,
            allow_image_submission: true,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    #[test]
    fn test_detailed_form() {
        // Arrange
        let sections = vec![section(0, "Chop onions.", "close-up"), section(1, "Simmer.", "")];

        // Act
        let script = render_detailed("Curry night", "A slow curry.", &sections);

        // Assert
        assert_eq!(
            script,
            "# Curry night\n\nA slow curry.\n\n---\n\n\
             ## Section 1\n\nChop onions.\n\n**Image instruction**: close-up\n\n---\n\n\
             ## Section 2\n\nSimmer.\n\n---\n\n"
        );
    }

    #[test]
    fn test_detailed_form_skips_missing_description() {
        let script = render_detailed("Curry night", "", &[]);

        assert_eq!(script, "# Curry night\n\n---\n\n");
    }

    #[test]
    fn test_plain_form_drops_blank_sections() {
        let sections = vec![
            section(0, "A", ""),
            section(1, "  \n ", "ignored"),
            section(2, "B", ""),
        ];

        assert_eq!(render_plain(&sections), "A\n\nB");
    }
}
