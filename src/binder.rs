use crate::config::BinderConfig;
use crate::errors::BinderError;
use crate::models::{
    finish_target_id, finish_text, FinishAttributes, FinishRequest, FinishResponse,
    StartAttributes, StartRequest,
};
use crate::state::SharedPage;
use crate::transport::{OutboundRequest, Transport};
use chrono::{DateTime, Local};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Start,
    Finish,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Started { response: Value },
    Finished { target: String, end_time: String },
}

/// A request issued by a click. Dropping it leaves the request running;
/// failures are logged either way.
pub struct InFlight {
    pub element: String,
    pub clicked_at: DateTime<Local>,
    handle: JoinHandle<Result<ClickOutcome, BinderError>>,
}

impl InFlight {
    pub async fn outcome(self) -> Result<ClickOutcome, BinderError> {
        self.handle.await?
    }
}

pub struct ClickHandlerBinder<T> {
    config: Arc<BinderConfig>,
    transport: Arc<T>,
}

impl<T: Transport> ClickHandlerBinder<T> {
    pub fn new(config: BinderConfig, transport: T) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
        }
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Attaches handlers to the elements present on the page right now.
    /// An element matched by both selectors keeps the start handler.
    pub async fn bind(&self, page: SharedPage) -> Result<BoundPage<T>, BinderError> {
        let mut handlers = BTreeMap::new();
        {
            let doc = page.page.lock().await;
            for index in doc.select(&self.config.start_selector)? {
                handlers.insert(index, Handler::Start);
            }
            if let Some(selector) = &self.config.finish_selector {
                for index in doc.select(selector)? {
                    handlers.entry(index).or_insert(Handler::Finish);
                }
            }
        }

        let starts = handlers.values().filter(|h| **h == Handler::Start).count();
        info!(
            start = starts,
            finish = handlers.len() - starts,
            "bound click handlers"
        );

        Ok(BoundPage {
            page,
            handlers,
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
        })
    }
}

pub struct BoundPage<T> {
    page: SharedPage,
    handlers: BTreeMap<usize, Handler>,
    config: Arc<BinderConfig>,
    transport: Arc<T>,
}

impl<T: Transport> BoundPage<T> {
    pub fn page(&self) -> &SharedPage {
        &self.page
    }

    pub fn handler(&self, index: usize) -> Option<Handler> {
        self.handlers.get(&index).copied()
    }

    pub async fn select(&self, selector: &str) -> Result<Vec<usize>, BinderError> {
        self.page.page.lock().await.select(selector)
    }

    /// Dispatches one click on the element at `index`.
    ///
    /// Attribute and configuration problems are reported here and nothing is
    /// sent. Otherwise exactly one request is spawned and `Some` is returned.
    /// Elements without a handler yield `None`.
    pub async fn click(&self, index: usize) -> Result<Option<InFlight>, BinderError> {
        let Some(handler) = self.handler(index) else {
            return Ok(None);
        };
        let clicked_at = Local::now();

        let (element, request) = {
            let doc = self.page.page.lock().await;
            let Some(target) = doc.element(index) else {
                return Ok(None);
            };
            let element = target.describe(index);
            let lookup = |name: &str| doc.data(index, name);
            let request = match handler {
                Handler::Start => self.start_request(&element, lookup)?,
                Handler::Finish => finish_request(&element, lookup)?,
            };
            (element, request)
        };

        debug!(%element, method = %request.method, url = %request.url, body = %request.body, "click");

        let transport = Arc::clone(&self.transport);
        let page = self.page.clone();
        let task_element = element.clone();
        let handle = tokio::spawn(async move {
            let result = match handler {
                Handler::Start => on_start(transport.as_ref(), request).await,
                Handler::Finish => on_finish(transport.as_ref(), &page, request).await,
            };
            if let Err(err) = &result {
                error!(element = %task_element, "time block request failed: {err}");
            }
            result
        });

        Ok(Some(InFlight {
            element,
            clicked_at,
            handle,
        }))
    }

    /// Clicks every element matching `selector`, in page order.
    pub async fn click_selector(&self, selector: &str) -> Result<Vec<InFlight>, BinderError> {
        let mut in_flight = Vec::new();
        for index in self.select(selector).await? {
            if let Some(request) = self.click(index).await? {
                in_flight.push(request);
            }
        }
        Ok(in_flight)
    }

    fn start_request<'a>(
        &self,
        element: &str,
        lookup: impl Fn(&str) -> Option<&'a str>,
    ) -> Result<OutboundRequest, BinderError> {
        let path = self
            .config
            .time_block_path
            .as_deref()
            .ok_or(BinderError::MissingTimeBlockPath)?;
        let body = StartRequest::from(StartAttributes::read(element, lookup)?);
        Ok(OutboundRequest::post(path, serde_json::to_string(&body)?))
    }
}

fn finish_request<'a>(
    element: &str,
    lookup: impl Fn(&str) -> Option<&'a str>,
) -> Result<OutboundRequest, BinderError> {
    let attrs = FinishAttributes::read(element, lookup)?;
    let body = FinishRequest::new(attrs.user_id, attrs.id);
    Ok(OutboundRequest::put(attrs.path, serde_json::to_string(&body)?))
}

async fn on_start<T: Transport>(
    transport: &T,
    request: OutboundRequest,
) -> Result<ClickOutcome, BinderError> {
    let response = transport.send(request).await?;
    info!(%response, "time block started");
    Ok(ClickOutcome::Started { response })
}

async fn on_finish<T: Transport>(
    transport: &T,
    page: &SharedPage,
    request: OutboundRequest,
) -> Result<ClickOutcome, BinderError> {
    let response: FinishResponse = serde_json::from_value(transport.send(request).await?)?;
    let target = finish_target_id(&response.data.id);

    page.page
        .lock()
        .await
        .set_text_by_id(&target, finish_text(&response.data.end_time))?;

    info!(%target, end_time = %response.data.end_time, "time block finished");
    Ok(ClickOutcome::Finished {
        target,
        end_time: response.data.end_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Element, Page};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutboundRequest>>,
        replies: Mutex<VecDeque<Result<Value, BinderError>>>,
    }

    impl RecordingTransport {
        fn replying(replies: Vec<Result<Value, BinderError>>) -> Self {
            Self {
                sent: Mutex::default(),
                replies: Mutex::new(replies.into()),
            }
        }

        fn sent(&self) -> Vec<OutboundRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Transport for RecordingTransport {
        async fn send(&self, request: OutboundRequest) -> Result<Value, BinderError> {
            self.sent.lock().unwrap().push(request);
            let reply = self.replies.lock().unwrap().pop_front();
            reply.unwrap_or_else(|| Ok(json!({ "data": {} })))
        }
    }

    fn page() -> SharedPage {
        SharedPage::new(Page::new(vec![
            Element::with_id("start-button")
                .data("user-id", "7")
                .data("task-id", "3"),
            Element::with_class("finish-button")
                .data("user-id", "7")
                .data("id", "42")
                .data("path", "/time_blocks/42"),
            Element::with_id("tb-42").text("running"),
            Element::with_class("finish-button")
                .data("user-id", "7")
                .data("id", "43")
                .data("path", "/time_blocks/43"),
            Element::with_id("tb-43").text("running"),
        ]))
    }

    fn finished(id: &str, end_time: &str) -> Result<Value, BinderError> {
        Ok(json!({ "data": { "id": id, "end_time": end_time } }))
    }

    fn body(request: &OutboundRequest) -> Value {
        serde_json::from_str(&request.body).unwrap()
    }

    #[tokio::test]
    async fn start_click_posts_once_to_configured_path() {
        let binder = ClickHandlerBinder::new(
            BinderConfig::new("/time_blocks"),
            RecordingTransport::replying(vec![Ok(json!({ "data": { "id": 1 } }))]),
        );
        let bound = binder.bind(page()).await.unwrap();

        let outcome = bound.click(0).await.unwrap().unwrap().outcome().await.unwrap();

        let sent = binder.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, reqwest::Method::POST);
        assert_eq!(sent[0].url, "/time_blocks");
        assert_eq!(
            body(&sent[0]),
            json!({ "time_block": { "user_id": 7, "task_id": 3 } })
        );
        assert_eq!(
            outcome,
            ClickOutcome::Started {
                response: json!({ "data": { "id": 1 } })
            }
        );
        assert_eq!(bound.page().snapshot().await, page().snapshot().await);
    }

    #[tokio::test]
    async fn start_click_without_path_sends_nothing() {
        let binder = ClickHandlerBinder::new(
            BinderConfig::default(),
            RecordingTransport::default(),
        );
        let bound = binder.bind(page()).await.unwrap();

        let err = bound.click(0).await.err().unwrap();

        assert!(matches!(err, BinderError::MissingTimeBlockPath));
        assert!(binder.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn finish_click_puts_to_element_path_and_updates_target() {
        let binder = ClickHandlerBinder::new(
            BinderConfig::new("/time_blocks"),
            RecordingTransport::replying(vec![finished("42", "2024-01-01T10:00:00")]),
        );
        let bound = binder.bind(page()).await.unwrap();

        let outcome = bound.click(1).await.unwrap().unwrap().outcome().await.unwrap();

        let sent = binder.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, reqwest::Method::PUT);
        assert_eq!(sent[0].url, "/time_blocks/42");
        let sent_body = body(&sent[0]);
        assert_eq!(sent_body["id"], sent_body["time_block"]["id"]);
        assert_eq!(sent_body["time_block"]["finished"], json!(true));
        assert_eq!(sent_body["time_block"]["user_id"], json!(7));

        assert_eq!(
            outcome,
            ClickOutcome::Finished {
                target: "tb-42".into(),
                end_time: "2024-01-01T10:00:00".into(),
            }
        );
        let snapshot = bound.page().snapshot().await;
        assert_eq!(
            snapshot.element_by_id("tb-42").unwrap().text,
            "\n2024-01-01T10:00:00\n"
        );
        assert_eq!(snapshot.element_by_id("tb-43").unwrap().text, "running");
    }

    #[tokio::test]
    async fn double_finish_click_issues_two_requests() {
        let binder = ClickHandlerBinder::new(
            BinderConfig::new("/time_blocks"),
            RecordingTransport::replying(vec![
                finished("42", "2024-01-01T10:00:00"),
                finished("42", "2024-01-01T10:00:05"),
            ]),
        );
        let bound = binder.bind(page()).await.unwrap();

        let first = bound.click(1).await.unwrap().unwrap();
        let second = bound.click(1).await.unwrap().unwrap();
        first.outcome().await.unwrap();
        second.outcome().await.unwrap();

        let sent = binder.transport().sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], sent[1]);
    }

    #[tokio::test]
    async fn responses_are_matched_by_payload_id() {
        let binder = ClickHandlerBinder::new(
            BinderConfig::new("/time_blocks"),
            RecordingTransport::replying(vec![
                finished("43", "2024-01-01T11:00:00"),
                finished("42", "2024-01-01T12:00:00"),
            ]),
        );
        let bound = binder.bind(page()).await.unwrap();

        let in_flight = bound.click_selector(".finish-button").await.unwrap();
        assert_eq!(in_flight.len(), 2);
        for request in in_flight {
            request.outcome().await.unwrap();
        }

        let snapshot = bound.page().snapshot().await;
        assert_eq!(
            snapshot.element_by_id("tb-43").unwrap().text,
            "\n2024-01-01T11:00:00\n"
        );
        assert_eq!(
            snapshot.element_by_id("tb-42").unwrap().text,
            "\n2024-01-01T12:00:00\n"
        );
    }

    #[tokio::test]
    async fn malformed_finish_response_leaves_page_and_handlers_working() {
        let binder = ClickHandlerBinder::new(
            BinderConfig::new("/time_blocks"),
            RecordingTransport::replying(vec![
                Ok(json!({ "data": { "id": "42" } })),
                Ok(json!({ "data": { "id": 2 } })),
                finished("43", "2024-01-01T10:00:00"),
            ]),
        );
        let bound = binder.bind(page()).await.unwrap();

        let err = bound.click(1).await.unwrap().unwrap().outcome().await.unwrap_err();
        assert!(matches!(err, BinderError::UnexpectedResponse(_)));
        assert_eq!(bound.page().snapshot().await, page().snapshot().await);

        bound.click(0).await.unwrap().unwrap().outcome().await.unwrap();
        bound.click(3).await.unwrap().unwrap().outcome().await.unwrap();
        let snapshot = bound.page().snapshot().await;
        assert_eq!(
            snapshot.element_by_id("tb-43").unwrap().text,
            "\n2024-01-01T10:00:00\n"
        );
    }

    #[tokio::test]
    async fn failed_request_is_reported_without_mutation() {
        let binder = ClickHandlerBinder::new(
            BinderConfig::new("/time_blocks"),
            RecordingTransport::replying(vec![Err(BinderError::Status {
                status: 422,
                body: "{}".into(),
            })]),
        );
        let bound = binder.bind(page()).await.unwrap();

        let err = bound.click(1).await.unwrap().unwrap().outcome().await.unwrap_err();

        assert!(matches!(err, BinderError::Status { status: 422, .. }));
        assert_eq!(bound.page().snapshot().await, page().snapshot().await);
    }

    #[tokio::test]
    async fn unknown_target_id_is_an_error() {
        let binder = ClickHandlerBinder::new(
            BinderConfig::new("/time_blocks"),
            RecordingTransport::replying(vec![finished("99", "2024-01-01T10:00:00")]),
        );
        let bound = binder.bind(page()).await.unwrap();

        let err = bound.click(1).await.unwrap().unwrap().outcome().await.unwrap_err();

        assert!(matches!(err, BinderError::MissingTarget(id) if id == "tb-99"));
    }

    #[tokio::test]
    async fn start_only_variant_ignores_finish_buttons() {
        let binder = ClickHandlerBinder::new(
            BinderConfig::new("/time_blocks").without_finish(),
            RecordingTransport::default(),
        );
        let bound = binder.bind(page()).await.unwrap();

        assert_eq!(bound.handler(0), Some(Handler::Start));
        assert_eq!(bound.handler(1), None);
        assert!(bound.click(1).await.unwrap().is_none());
        assert!(binder.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn elements_added_after_bind_are_not_handled() {
        let binder = ClickHandlerBinder::new(
            BinderConfig::new("/time_blocks"),
            RecordingTransport::default(),
        );
        let shared = page();
        let bound = binder.bind(shared.clone()).await.unwrap();

        shared.page.lock().await.elements.push(
            Element::with_class("finish-button")
                .data("user-id", "7")
                .data("id", "44")
                .data("path", "/time_blocks/44"),
        );

        assert!(bound.click(5).await.unwrap().is_none());
        assert!(binder.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn missing_attribute_is_rejected_before_sending() {
        let shared = SharedPage::new(Page::new(vec![
            Element::with_id("start-button").data("user-id", "7"),
        ]));
        let binder = ClickHandlerBinder::new(
            BinderConfig::new("/time_blocks"),
            RecordingTransport::default(),
        );
        let bound = binder.bind(shared).await.unwrap();

        let err = bound.click(0).await.err().unwrap();

        assert!(matches!(
            err,
            BinderError::MissingAttribute { attribute: "task-id", .. }
        ));
        assert!(binder.transport().sent().is_empty());
    }
}
