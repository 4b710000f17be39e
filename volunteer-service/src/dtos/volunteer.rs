use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::Volunteer;

/// Volunteer attach payload. The owning account comes from the access
/// token, never from the body.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVolunteerRequest {
    #[validate(length(min = 1, max = 128, message = "Location is required"))]
    pub location: String,

    pub availability: bool,

    #[validate(length(max = 256, message = "Task must be at most 256 characters"))]
    pub task: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VolunteerResponse {
    pub volunteer_id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub location: String,
    pub availability: bool,
    pub task: Option<String>,
}

impl From<Volunteer> for VolunteerResponse {
    fn from(v: Volunteer) -> Self {
        Self {
            volunteer_id: v.volunteer_id,
            name: v.name,
            phone_number: v.phone_number,
            location: v.location,
            availability: v.availability,
            task: v.task,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckUserRequest {
    #[validate(length(min = 7, max = 20, message = "Phone number must be 7-20 characters"))]
    pub phone_number: String,
}

#[derive(Debug, Serialize)]
pub struct CheckUserResponse {
    pub exists: bool,
}
