use crate::interfaces::session::{EvaluateRequest, InitRequest, RunRequest, Session};
use crate::interfaces::{Interface, Message, RunResult};
use crate::Error;
use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::stream::{self, Stream};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};
use uuid::Uuid;

/// HTTP API 响应类型
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ApiResponse<T> {
    #[serde(rename = "success")]
    Success { result: T },
    #[serde(rename = "error")]
    Error { error: String },
}

impl<T> ApiResponse<T> {
    fn error(error: impl Into<String>) -> Json<Self> {
        Json(Self::Error {
            error: error.into(),
        })
    }
}

/// 搜索状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Idle,
    Running {
        id: Uuid,
        message: Option<Message>,
    },
    Completed {
        id: Uuid,
        result: RunResult,
    },
    Failed {
        id: Uuid,
        error: String,
    },
}

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<Session>>,
    pub status: Arc<RwLock<RunStatus>>,
    pub status_broadcast: broadcast::Sender<RunStatus>,
    /// 会话的停止标志，运行期间不需要获取会话的锁就能设置
    pub stop: Arc<AtomicBool>,
}

/// 把一次搜索的消息写入共享状态并广播给 SSE 订阅者
struct StatusSink {
    id: Uuid,
    status: Arc<RwLock<RunStatus>>,
    broadcast: broadcast::Sender<RunStatus>,
}

impl Interface for StatusSink {
    fn send(&self, message: Message) {
        if let Message::Progress(percent) = message {
            if percent % 10 == 0 {
                info!("[RUN {}] progress {percent}%", self.id);
            }
        }
        let status = RunStatus::Running {
            id: self.id,
            message: Some(message),
        };
        // 在 spawn_blocking 的线程中调用
        *self.status.blocking_write() = status.clone();
        let _ = self.broadcast.send(status);
    }
}

fn parse<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("invalid request: {e}"))
}

async fn is_running(state: &AppState) -> bool {
    matches!(*state.status.read().await, RunStatus::Running { .. })
}

/// HTTP API: 初始化偏好数据
pub async fn init(
    State(state): State<AppState>,
    Json(request): Json<serde_json::Value>,
) -> Json<ApiResponse<()>> {
    info!("POST /api/init");
    let request: InitRequest = match parse(request) {
        Ok(request) => request,
        Err(e) => return ApiResponse::error(e),
    };
    if is_running(&state).await {
        return ApiResponse::error("cannot initialise while a search is running");
    }
    let result = state.session.write().await.init(request);
    match result {
        Ok(()) => Json(ApiResponse::Success { result: () }),
        Err(e) => ApiResponse::error(e.message),
    }
}

/// HTTP API: 评测方案
pub async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<serde_json::Value>,
) -> Json<ApiResponse<Vec<String>>> {
    info!("POST /api/evaluate");
    let request: EvaluateRequest = match parse(request) {
        Ok(request) => request,
        Err(e) => return ApiResponse::error(e),
    };
    let result = state.session.read().await.evaluate(request);
    match result {
        Ok(lines) => Json(ApiResponse::Success { result: lines }),
        Err(e) => ApiResponse::error(e.message),
    }
}

/// HTTP API: 开始搜索（异步），立即返回本次运行的编号
pub async fn run(
    State(state): State<AppState>,
    Json(request): Json<serde_json::Value>,
) -> Json<ApiResponse<Uuid>> {
    info!("POST /api/run");
    let request: RunRequest = match parse(request) {
        Ok(request) => request,
        Err(e) => return ApiResponse::error(e),
    };
    let id = Uuid::new_v4();
    {
        let mut status = state.status.write().await;
        if matches!(*status, RunStatus::Running { .. }) {
            return ApiResponse::error("a search is already running");
        }
        if let Err(e) = state.session.read().await.preferences() {
            return ApiResponse::error(e.message);
        }
        // 上一次搜索结束之后才到达的停止请求不能作用于这一次
        state.stop.store(false, Ordering::Relaxed);
        *status = RunStatus::Running { id, message: None };
        let _ = state.status_broadcast.send(status.clone());
    }

    let session = state.session.clone();
    let status = state.status.clone();
    let broadcast = state.status_broadcast.clone();
    tokio::spawn(async move {
        let sink = StatusSink {
            id,
            status: status.clone(),
            broadcast: broadcast.clone(),
        };
        let result = tokio::task::spawn_blocking(move || {
            let session = session.blocking_read();
            session.run_with(request, &sink)
        })
        .await;
        let final_status = match result {
            Ok(Ok(result)) => {
                info!("[RUN {id}] completed with fitness {}", result.fitness);
                RunStatus::Completed { id, result }
            }
            Ok(Err(e)) => {
                warn!("[RUN {id}] failed: {}", e.message);
                RunStatus::Failed {
                    id,
                    error: e.message,
                }
            }
            Err(e) => {
                warn!("[RUN {id}] task panicked: {e:?}");
                RunStatus::Failed {
                    id,
                    error: format!("task panicked: {e:?}"),
                }
            }
        };
        *status.write().await = final_status.clone();
        let _ = broadcast.send(final_status);
    });

    Json(ApiResponse::Success { result: id })
}

/// HTTP API: 请求停止正在进行的搜索，搜索会在下一代开始前结束
pub async fn stop(State(state): State<AppState>) -> Json<ApiResponse<()>> {
    info!("POST /api/stop");
    // 持有状态的读锁，与 /api/run 接纳新搜索的过程互斥
    let status = state.status.read().await;
    if !matches!(*status, RunStatus::Running { .. }) {
        return ApiResponse::error("no search is running");
    }
    state.stop.store(true, Ordering::Relaxed);
    Json(ApiResponse::Success { result: () })
}

/// HTTP API: 当前状态
pub async fn status(State(state): State<AppState>) -> Json<RunStatus> {
    Json(state.status.read().await.clone())
}

/// SSE 处理函数：先发送当前状态，再转发之后的每一次更新
pub async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let initial = state.status.read().await.clone();
    let receiver = state.status_broadcast.subscribe();
    info!("[SSE] connection opened");
    let stream = stream::unfold(
        (Some(initial), receiver),
        |(pending, mut receiver)| async move {
            let status = match pending {
                Some(status) => status,
                None => loop {
                    match receiver.recv().await {
                        Ok(status) => break status,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("[SSE] client lagged behind by {skipped} updates");
                        }
                        Err(RecvError::Closed) => return None,
                    }
                },
            };
            let event = Event::default()
                .json_data(&status)
                .unwrap_or_else(|_| Event::default().comment("unserializable status"));
            Some((Ok(event), (None, receiver)))
        },
    );
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// 主页面
pub async fn index() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>genmatch API 服务器</title></head>
<body>
    <h1>genmatch API 服务器</h1>
    <ul>
        <li><code>POST /api/init</code> - 初始化偏好数据</li>
        <li><code>POST /api/run</code> - 开始搜索</li>
        <li><code>POST /api/stop</code> - 停止搜索</li>
        <li><code>POST /api/evaluate</code> - 评测方案</li>
        <li><code>GET /api/status</code> - 当前状态</li>
        <li><code>GET /sse/status</code> - SSE 实时状态推送</li>
    </ul>
</body>
</html>"#,
    )
}

/// 创建应用路由
pub fn create_app() -> Router {
    let session = Session::new();
    let (status_broadcast, _) = broadcast::channel(100);
    let state = AppState {
        stop: session.stop_handle(),
        session: Arc::new(RwLock::new(session)),
        status: Arc::new(RwLock::new(RunStatus::Idle)),
        status_broadcast,
    };
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/init", post(init))
        .route("/api/run", post(run))
        .route("/api/stop", post(stop))
        .route("/api/evaluate", post(evaluate))
        .route("/api/status", get(status))
        .route("/sse/status", get(sse_handler))
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
        .layer(cors)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(600),
        ))
        .with_state(state)
}

/// 尝试绑定可用端口：先试首选端口，再向上、向下各找 50 个，最后交给系统分配
async fn bind_available_port(preferred_port: u16) -> Result<(TcpListener, u16), Error> {
    match TcpListener::bind(("0.0.0.0", preferred_port)).await {
        Ok(listener) => return Ok((listener, preferred_port)),
        Err(e) => info!("端口 {preferred_port} 已被占用: {e}"),
    }
    let above = (1..=50).filter_map(|offset| preferred_port.checked_add(offset));
    let below = (1..=50)
        .filter_map(|offset| preferred_port.checked_sub(offset))
        .filter(|port| *port >= 1024);
    for port in above.chain(below) {
        if let Ok(listener) = TcpListener::bind(("0.0.0.0", port)).await {
            info!("成功绑定到替代端口: {port}");
            return Ok((listener, port));
        }
    }
    let listener = TcpListener::bind(("0.0.0.0", 0))
        .await
        .map_err(|e| Error::from(format!("无法绑定到任何端口: {e}")))?;
    let port = listener.local_addr()?.port();
    info!("使用系统自动分配的端口: {port}");
    Ok((listener, port))
}

/// 启动服务器
pub async fn start_server(port: u16) -> Result<(), Error> {
    let app = create_app();
    let (listener, actual_port) = bind_available_port(port).await?;

    info!("Listening on: http://127.0.0.1:{actual_port}");
    info!("API Endpoints:");
    info!("   POST /api/init        - 初始化偏好数据");
    info!("   POST /api/run         - 开始搜索");
    info!("   POST /api/stop        - 停止搜索");
    info!("   POST /api/evaluate    - 评测方案");
    info!("   GET  /api/status      - 当前状态");
    info!("   GET  /sse/status      - SSE 实时状态推送");

    axum::serve(listener, app).await?;
    Ok(())
}
