pub mod session_records;
