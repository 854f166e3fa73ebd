use crate::models::Style;

pub const DESCRIBE_SKETCH: &str = include_str!("../data/prompts/describe_sketch.txt");

/// Joins a sketch description and a style label into the synthesis prompt.
pub fn compose(description: &str, style: Style) -> String {
    format!("{}, Style: {}", description, style.label())
}
