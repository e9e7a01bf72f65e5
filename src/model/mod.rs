pub mod employee;
pub mod payroll_batch;
pub mod payroll_record;
pub mod role;
