//! 配置实现测试

mod loader_tests;
