// 状态管理模块

mod shared;

pub use shared::SharedState;
