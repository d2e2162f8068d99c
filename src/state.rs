use crate::page::Page;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handle to the page shared by click handlers and response continuations.
#[derive(Clone, Default)]
pub struct SharedPage {
    pub page: Arc<Mutex<Page>>,
}

impl SharedPage {
    pub fn new(page: Page) -> Self {
        Self {
            page: Arc::new(Mutex::new(page)),
        }
    }

    pub async fn snapshot(&self) -> Page {
        self.page.lock().await.clone()
    }
}
