//! Workbook type - the report document

use crate::error::{Error, Result};
use crate::worksheet::Worksheet;

/// A workbook (report document)
///
/// Holds one worksheet per reporting period tab, looked up by title.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    /// Worksheets in tab order
    worksheets: Vec<Worksheet>,
}

impl Workbook {
    /// Create an empty workbook with no worksheets
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by title
    pub fn worksheet(&self, title: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.title() == title)
    }

    /// Get a mutable worksheet by title
    pub fn worksheet_mut(&mut self, title: &str) -> Option<&mut Worksheet> {
        self.worksheets.iter_mut().find(|ws| ws.title() == title)
    }

    /// Get a worksheet by title, failing when it does not exist
    pub fn require_worksheet(&self, title: &str) -> Result<&Worksheet> {
        self.worksheet(title)
            .ok_or_else(|| Error::SheetNotFound(title.to_string()))
    }

    /// Get a mutable worksheet by title, failing when it does not exist
    pub fn require_worksheet_mut(&mut self, title: &str) -> Result<&mut Worksheet> {
        self.worksheet_mut(title)
            .ok_or_else(|| Error::SheetNotFound(title.to_string()))
    }

    /// Get a worksheet by title, adding an empty one when missing
    pub fn worksheet_or_insert(&mut self, title: &str) -> &mut Worksheet {
        let idx = match self.sheet_index(title) {
            Some(idx) => idx,
            None => {
                self.worksheets.push(Worksheet::new(title));
                self.worksheets.len() - 1
            }
        };
        &mut self.worksheets[idx]
    }

    /// Get the index of a worksheet by title
    pub fn sheet_index(&self, title: &str) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.title() == title)
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Add a new empty worksheet
    pub fn add_worksheet(&mut self, title: &str) -> Result<&mut Worksheet> {
        self.add_existing_worksheet(Worksheet::new(title))
    }

    /// Add an existing worksheet to the workbook
    pub fn add_existing_worksheet(&mut self, worksheet: Worksheet) -> Result<&mut Worksheet> {
        if self.sheet_index(worksheet.title()).is_some() {
            return Err(Error::DuplicateSheetName(worksheet.title().to_string()));
        }
        self.worksheets.push(worksheet);
        let idx = self.worksheets.len() - 1;
        Ok(&mut self.worksheets[idx])
    }

    /// Remove a worksheet by title
    pub fn remove_worksheet(&mut self, title: &str) -> Result<Worksheet> {
        let idx = self
            .sheet_index(title)
            .ok_or_else(|| Error::SheetNotFound(title.to_string()))?;
        Ok(self.worksheets.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_worksheets() {
        let mut wb = Workbook::new();
        assert!(wb.is_empty());

        wb.add_worksheet("Week Summary").unwrap();
        wb.add_worksheet("Month Summary").unwrap();

        assert_eq!(wb.sheet_count(), 2);
        assert_eq!(wb.sheet_index("Month Summary"), Some(1));
    }

    #[test]
    fn test_duplicate_title() {
        let mut wb = Workbook::new();
        wb.add_worksheet("Daily Summary").unwrap();
        assert!(matches!(
            wb.add_worksheet("Daily Summary"),
            Err(Error::DuplicateSheetName(_))
        ));
    }

    #[test]
    fn test_worksheet_or_insert() {
        let mut wb = Workbook::new();
        wb.worksheet_or_insert("Week Summary");
        wb.worksheet_or_insert("Week Summary");
        assert_eq!(wb.sheet_count(), 1);
    }

    #[test]
    fn test_lookup_by_title() {
        let mut wb = Workbook::new();
        wb.add_worksheet("Week Summary").unwrap();

        assert!(wb.require_worksheet("Week Summary").is_ok());
        assert!(matches!(
            wb.require_worksheet("Nope"),
            Err(Error::SheetNotFound(_))
        ));
        assert!(wb.remove_worksheet("Week Summary").is_ok());
        assert!(wb.is_empty());
    }
}
