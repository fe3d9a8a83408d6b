use crate::{
    error::{BursaryError, Result},
    models::{Application, ApplicationId},
};

/// Rows picked for a batch decision, in the order they were picked.
/// Only Pending applications can be added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    ids: Vec<ApplicationId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, application: &Application) -> Result<()> {
        if !application.is_pending() {
            return Err(BursaryError::InvalidInput(format!(
                "application {} is already {}",
                application.id,
                application.application_status.as_str().to_lowercase()
            )));
        }
        if !self.contains(&application.id) {
            self.ids.push(application.id.clone());
        }
        Ok(())
    }

    /// Returns whether the row is selected afterwards
    pub fn toggle(&mut self, application: &Application) -> Result<bool> {
        if self.contains(&application.id) {
            self.deselect(&application.id);
            Ok(false)
        } else {
            self.select(application)?;
            Ok(true)
        }
    }

    pub fn deselect(&mut self, id: &ApplicationId) {
        self.ids.retain(|selected| selected != id);
    }

    /// Adds every Pending row, skipping the rest
    pub fn select_all_pending<'a>(&mut self, applications: impl IntoIterator<Item = &'a Application>) {
        for application in applications {
            if application.is_pending() && !self.contains(&application.id) {
                self.ids.push(application.id.clone());
            }
        }
    }

    pub fn contains(&self, id: &ApplicationId) -> bool {
        self.ids.iter().any(|selected| selected == id)
    }

    pub fn ids(&self) -> &[ApplicationId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
