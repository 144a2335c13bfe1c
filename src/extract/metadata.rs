use crate::extract::ExtractError;
use crate::model::anchor_date;
use chrono::NaiveDate;
use std::path::Path;

/// Year and category encoded in an input file name such as `2023_2W.xlsx`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileMetadata {
    /// Year token as written in the file name
    pub year: String,
    /// Uppercased category code
    pub category: String,
    /// Mid-year date every record of the file is stamped with
    pub registration_date: NaiveDate,
}

impl FileMetadata {
    /// Validates a year token and category code.
    pub fn new(year: &str, category: &str) -> Result<Self, ExtractError> {
        let category = category.trim().to_uppercase();
        if category.is_empty() {
            return Err(ExtractError::FileFormat(format!("empty category code next to year '{year}'")));
        }
        let registration_date = year
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|_| year.trim().chars().all(|c| c.is_ascii_digit()))
            .and_then(anchor_date)
            .ok_or_else(|| ExtractError::FileFormat(format!("'{year}' is not a calendar year")))?;
        Ok(FileMetadata {
            year: year.trim().to_owned(),
            category,
            registration_date,
        })
    }

    /// Splits the base name (file name without its final extension) on `_`:
    /// the first token is the year, the second the category. Further tokens
    /// are ignored.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| ExtractError::FileFormat(format!("unreadable file name '{}'", path.display())))?;
        let mut tokens = stem.split('_');
        match (tokens.next(), tokens.next()) {
            (Some(year), Some(category)) => Self::new(year, category),
            _ => Err(ExtractError::FileFormat(format!(
                "'{stem}' does not follow <year>_<category>"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_year_and_category() {
        let metadata = FileMetadata::from_path(Path::new("data/raw/2023_2w.xlsx")).unwrap();
        assert_eq!(metadata.year, "2023");
        assert_eq!(metadata.category, "2W");
        assert_eq!(metadata.registration_date, NaiveDate::from_ymd_opt(2023, 6, 15).unwrap());
    }

    #[test]
    fn extra_tokens_are_ignored() {
        let metadata = FileMetadata::from_path(Path::new("2021_3W_revised.v2.ods")).unwrap();
        assert_eq!(metadata.year, "2021");
        assert_eq!(metadata.category, "3W");
    }

    #[test]
    fn single_token_names_are_format_errors() {
        let error = FileMetadata::from_path(Path::new("registrations.xlsx")).unwrap_err();
        assert!(matches!(error, ExtractError::FileFormat(_)));
    }

    #[test]
    fn invalid_years_and_empty_categories_are_format_errors() {
        assert!(FileMetadata::from_path(Path::new("FY23_2W.xlsx")).is_err());
        assert!(FileMetadata::from_path(Path::new("2023_.xlsx")).is_err());
        assert!(FileMetadata::new("+2023", "2W").is_err());
        assert!(FileMetadata::new("2023", "4w").is_ok());
    }
}
