use crate::error::RegistrationError;
use glob::Pattern;

/// Chooses which worksheet of a workbook becomes the grid.
#[derive(Clone, Debug, Default)]
pub struct SheetSelector {
    /// Sheet name pattern; `None` accepts the first sheet.
    pattern: Option<Pattern>,
}

impl SheetSelector {
    /// Selector for an optional glob such as `Sheet*` or `Report ?`.
    pub fn new(pattern: Option<&str>) -> Result<Self, RegistrationError> {
        Ok(SheetSelector {
            pattern: pattern.map(Pattern::new).transpose()?,
        })
    }

    pub fn accept(&self, sheet_name: &str) -> bool {
        self.pattern
            .as_ref()
            .map(|pattern| pattern.matches(sheet_name))
            .unwrap_or(true)
    }

    /// Pattern text for messages.
    pub fn describe(&self) -> &str {
        self.pattern.as_ref().map(Pattern::as_str).unwrap_or("*")
    }
}
