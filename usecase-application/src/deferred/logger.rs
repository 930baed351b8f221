use serde_json::{Map, Value};

/// 工作者的失败日志出口
pub trait JobLogger: Send + Sync {
    fn error(&self, message: &str, context: &Map<String, Value>);
}

/// 默认实现：输出一条 `tracing::error!` 结构化事件
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingJobLogger;

impl JobLogger for TracingJobLogger {
    fn error(&self, message: &str, context: &Map<String, Value>) {
        let command = context.get("command").and_then(Value::as_str).unwrap_or("");
        let context = Value::Object(context.clone());
        tracing::error!(command, context = %context, "{message}");
    }
}
