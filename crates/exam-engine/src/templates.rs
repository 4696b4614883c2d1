//! Embedded Typst template for the exam sheet
//!
//! The template is loaded from `templates/exam_sheet.typ` at compile time
//! and reads all of its content from `sys.inputs.sheet`.

/// Exam sheet template - loaded from templates/exam_sheet.typ
pub const EXAM_SHEET_TEMPLATE: &str = include_str!("../templates/exam_sheet.typ");

#[cfg(test)]
mod tests {
    use super::*;
    use typst::syntax::parse;

    #[test]
    fn test_template_parses() {
        let root = parse(EXAM_SHEET_TEMPLATE);
        let errors = root.errors();
        assert!(errors.is_empty(), "template has syntax errors: {:?}", errors);
    }

    #[test]
    fn test_template_reads_inputs_only() {
        assert!(EXAM_SHEET_TEMPLATE.contains("sys.inputs.sheet"));
        assert!(!EXAM_SHEET_TEMPLATE.contains("#include"));
        assert!(!EXAM_SHEET_TEMPLATE.contains("eval("));
    }
}
