mod concurrent_tests;
mod strategy_tests;
