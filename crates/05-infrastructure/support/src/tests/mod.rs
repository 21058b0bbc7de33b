//! 支持库测试
