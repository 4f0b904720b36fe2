use super::session::{EvaluateRequest, InitRequest, RunRequest, Session};
use super::{Interface, Message};
use js_sys::Function;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::{prelude::*, JsError};

fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// 在 Web Worker 中使用 genmatch 的入口，实现了界面特征
#[wasm_bindgen]
pub struct Web {
    callback: Function,
    session: Session,
}

#[wasm_bindgen]
impl Web {
    pub fn new(callback: Function) -> Web {
        set_panic_hook();
        Self {
            callback,
            session: Session::new(),
        }
    }

    pub fn init(&mut self, request: JsValue) -> Result<(), JsError> {
        let request: InitRequest = from_value(request)?;
        self.session.init(request)?;
        Ok(())
    }

    pub fn run(&self, request: JsValue) -> Result<JsValue, JsError> {
        let request: RunRequest = from_value(request)?;
        let result = self.session.run_with(request, self)?;
        let serializer = Serializer::json_compatible();
        Ok(result.serialize(&serializer)?)
    }

    pub fn evaluate(&self, request: JsValue) -> Result<(), JsError> {
        let request: EvaluateRequest = from_value(request)?;
        let lines = self.session.evaluate(request)?;
        self.send(Message::Evaluate(lines));
        Ok(())
    }
}

impl Interface for Web {
    fn send(&self, message: Message) {
        let serializer = Serializer::json_compatible();
        let Ok(value) = message.serialize(&serializer) else {
            return;
        };
        // 回调抛出的异常不影响搜索
        let _ = self.callback.call1(&JsValue::null(), &value);
    }
}
