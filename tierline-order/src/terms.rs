use chrono::NaiveDate;
use rust_decimal::Decimal;
use tierline_shared::Terms;

use crate::tables::{select_scoped, TermsRule};

const DEFAULT_NET_DAYS: u32 = 30;

impl TermsRule {
    /// Terms described by this row.
    ///
    /// `DATED` carries its due date verbatim and no day count, `CIA` is due
    /// at once, and any other code is a net code.
    pub fn to_terms(&self) -> Terms {
        let code = self.terms_code.trim().to_uppercase();
        let mut terms = match code.as_str() {
            "DATED" => Terms {
                code: code.clone(),
                net_days: None,
                due_date: self.due_date.clone(),
                needs_review: false,
                review_reason: None,
            },
            "CIA" => Terms::net(code.clone(), 0),
            _ => {
                let days = self
                    .net_days
                    .or_else(|| trailing_days(&code))
                    .unwrap_or(DEFAULT_NET_DAYS);
                Terms::net(code.clone(), days)
            }
        };
        terms.needs_review = self.needs_review;
        terms.review_reason = self.review_reason.clone();
        terms
    }
}

/// `NET_60` → 60, `Net 45` → 45
fn trailing_days(code: &str) -> Option<u32> {
    let digits: String = code
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}

/// First terms row for the program (or `STANDARD`) covering the total and date
pub fn resolve_terms(rows: &[TermsRule], program_id: &str, total: Decimal, as_of: NaiveDate) -> Option<Terms> {
    select_scoped(rows, program_id, total, as_of)
        .first()
        .map(|row| row.to_terms())
}
