pub mod trade_log;
