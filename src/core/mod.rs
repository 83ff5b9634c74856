//! 核心框架模块
//!
//! - Service: 服务注册与依赖注入
//! - Event: 事件类型层级与内置事件

pub mod event;
pub mod service;

pub use event::{Event, EventClass, EventRef, EventType, IntoEvent, Origin};
pub use service::{Service, ServiceError, ServiceRegistry};
