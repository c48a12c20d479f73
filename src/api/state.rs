use std::sync::Arc;

use crate::coordinator::Coordinator;

#[derive(Clone)]
pub struct ApiState {
    pub coordinator: Arc<Coordinator>,
}

impl ApiState {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }
}
