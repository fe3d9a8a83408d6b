use crossterm::event::{Event as CrosstermEvent, KeyEvent};
use tui_input::{backend::crossterm::EventHandler as _, Input};

use crate::{
    approval::{ApplicationDetails, ApprovalForm, Disposition},
    error::{BursaryError, Result},
    models::{Currency, Money},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Disposition,
    Amount,
    Currency,
    Batch,
    Remark,
}

impl FormField {
    pub fn label(&self) -> &'static str {
        match self {
            FormField::Disposition => "Decision",
            FormField::Amount => "Amount allocated",
            FormField::Currency => "Currency",
            FormField::Batch => "Batch number",
            FormField::Remark => "Remark",
        }
    }

    fn is_text(&self) -> bool {
        matches!(self, FormField::Amount | FormField::Batch | FormField::Remark)
    }
}

const FIELD_ORDER: [FormField; 5] = [
    FormField::Disposition,
    FormField::Amount,
    FormField::Currency,
    FormField::Batch,
    FormField::Remark,
];

/// What a submitted form applies to
#[derive(Debug, Clone)]
pub enum FormTarget {
    /// Every application in the current selection
    Selection(usize),
    /// The application open in the details view
    Details(Box<ApplicationDetails>),
}

/// Editable state of the decision popup
#[derive(Debug, Clone)]
pub struct FormState {
    pub target: FormTarget,
    pub focus: FormField,
    pub disposition: Disposition,
    pub currency: Currency,
    pub amount: Input,
    pub batch: Input,
    pub remark: Input,
    pub error: Option<String>,
}

impl FormState {
    pub fn for_selection(count: usize) -> Self {
        Self {
            target: FormTarget::Selection(count),
            focus: FormField::Disposition,
            disposition: Disposition::Approved,
            currency: Currency::default(),
            amount: Input::default(),
            batch: Input::default(),
            remark: Input::default(),
            error: None,
        }
    }

    /// Prefilled from the application's current approval record
    pub fn for_details(details: ApplicationDetails) -> Self {
        let form = details.approval_form();
        let allocation = form.allocation();
        let amount = if allocation.amount > 0.0 {
            allocation.amount.to_string()
        } else {
            String::new()
        };

        Self {
            target: FormTarget::Details(Box::new(details)),
            focus: FormField::Disposition,
            disposition: form.disposition(),
            currency: allocation.currency,
            amount: Input::new(amount),
            batch: Input::new(form.batch_label().to_string()),
            remark: Input::new(form.remark().to_string()),
            error: None,
        }
    }

    pub fn title(&self) -> String {
        match &self.target {
            FormTarget::Selection(count) => format!("Decide {} selected application(s)", count),
            FormTarget::Details(details) => {
                format!("Decide {}", details.application.applicant_full_name)
            }
        }
    }

    /// Amount, currency and batch only apply to approvals
    pub fn is_enabled(&self, field: FormField) -> bool {
        self.disposition == Disposition::Approved
            || matches!(field, FormField::Disposition | FormField::Remark)
    }

    pub fn next_field(&mut self) {
        self.focus = self.step(1);
    }

    pub fn previous_field(&mut self) {
        self.focus = self.step(FIELD_ORDER.len() - 1);
    }

    fn step(&self, by: usize) -> FormField {
        let mut index = FIELD_ORDER
            .iter()
            .position(|f| *f == self.focus)
            .unwrap_or(0);
        loop {
            index = (index + by) % FIELD_ORDER.len();
            let field = FIELD_ORDER[index];
            if self.is_enabled(field) {
                return field;
            }
        }
    }

    /// Flip the focused choice field
    pub fn toggle(&mut self) {
        match self.focus {
            FormField::Disposition => {
                self.disposition = match self.disposition {
                    Disposition::Approved => Disposition::Rejected,
                    Disposition::Rejected => Disposition::Approved,
                };
            }
            FormField::Currency => {
                self.currency = match self.currency {
                    Currency::KES => Currency::USD,
                    Currency::USD => Currency::KES,
                };
            }
            _ => {}
        }
    }

    /// Feed a key to the focused text input. Returns false for choice fields.
    pub fn input(&mut self, key: KeyEvent) -> bool {
        let event = CrosstermEvent::Key(key);
        let handled = match self.focus {
            FormField::Amount => self.amount.handle_event(&event).is_some(),
            FormField::Batch => self.batch.handle_event(&event).is_some(),
            FormField::Remark => self.remark.handle_event(&event).is_some(),
            _ => false,
        };
        if handled {
            self.error = None;
        }
        handled
    }

    pub fn focused_input(&self) -> Option<&Input> {
        match self.focus {
            FormField::Amount => Some(&self.amount),
            FormField::Batch => Some(&self.batch),
            FormField::Remark => Some(&self.remark),
            _ => None,
        }
    }

    pub fn focus_is_text(&self) -> bool {
        self.focus.is_text()
    }

    pub fn fields(&self) -> [FormField; 5] {
        FIELD_ORDER
    }

    /// Display value of `field`
    pub fn value(&self, field: FormField) -> String {
        match field {
            FormField::Disposition => self.disposition.to_string(),
            FormField::Amount => self.amount.value().to_string(),
            FormField::Currency => self.currency.to_string(),
            FormField::Batch => self.batch.value().to_string(),
            FormField::Remark => self.remark.value().to_string(),
        }
    }

    /// The form as entered. Validation of the amount itself happens on resolve.
    pub fn build(&self) -> Result<ApprovalForm> {
        let form = match self.disposition {
            Disposition::Approved => {
                let raw = self.amount.value().trim().replace(',', "");
                let amount = if raw.is_empty() {
                    0.0
                } else {
                    raw.parse::<f64>().map_err(|_| {
                        BursaryError::InvalidInput(format!(
                            "'{}' is not a valid amount",
                            self.amount.value()
                        ))
                    })?
                };
                ApprovalForm::approve(Money::new(amount, self.currency))
                    .with_batch_label(self.batch.value().trim())
            }
            Disposition::Rejected => ApprovalForm::reject(),
        };

        Ok(form.with_remark(self.remark.value().trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::staff_identity;
    use chrono::Utc;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(form: &mut FormState, text: &str) {
        for ch in text.chars() {
            form.input(key(KeyCode::Char(ch)));
        }
    }

    #[test]
    fn test_rejection_skips_approval_fields() {
        let mut form = FormState::for_selection(2);
        form.toggle();
        assert_eq!(form.disposition, Disposition::Rejected);

        form.next_field();
        assert_eq!(form.focus, FormField::Remark);
        form.next_field();
        assert_eq!(form.focus, FormField::Disposition);
        form.previous_field();
        assert_eq!(form.focus, FormField::Remark);
    }

    #[test]
    fn test_typed_values_build_an_approval() {
        let mut form = FormState::for_selection(1);
        form.next_field();
        type_text(&mut form, "5,000");
        form.next_field();
        form.toggle();
        form.next_field();
        type_text(&mut form, "B-7");

        let built = form.build().unwrap();
        assert_eq!(built.disposition(), Disposition::Approved);
        assert_eq!(built.allocation(), Money::new(5000.0, Currency::USD));
        assert_eq!(built.batch_label(), "B-7");
    }

    #[test]
    fn test_non_numeric_amount_is_rejected() {
        let mut form = FormState::for_selection(1);
        form.next_field();
        type_text(&mut form, "lots");

        assert!(matches!(form.build(), Err(BursaryError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_amount_fails_on_resolve() {
        let form = FormState::for_selection(1);
        let built = form.build().unwrap();
        assert!(built.resolve(&staff_identity(), Utc::now()).is_err());
    }

    #[test]
    fn test_choice_fields_ignore_typing() {
        let mut form = FormState::for_selection(1);
        assert!(!form.input(key(KeyCode::Char('x'))));
        assert!(!form.focus_is_text());
    }
}
