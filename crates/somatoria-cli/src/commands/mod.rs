pub mod grade;
pub mod init;
pub mod parse;
pub mod scan;
pub mod validate;
