use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{required_text, Identified};
use crate::utils::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl Identified for Attendee {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAttendee {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl NewAttendee {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
        }
    }

    pub fn into_attendee(self) -> Result<Attendee, AppError> {
        Ok(Attendee {
            id: Uuid::new_v4(),
            name: required_text("Attendee", "name", self.name)?,
            email: required_text("Attendee", "email", self.email)?,
        })
    }
}
