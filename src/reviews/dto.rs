use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    pub rating: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateReviewRequest {
    pub title: Option<String>,
    pub text: Option<String>,
    pub rating: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ReviewList<T> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> ReviewList<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}
