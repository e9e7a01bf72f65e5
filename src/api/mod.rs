pub mod employee;
pub mod import;
pub mod payroll;
