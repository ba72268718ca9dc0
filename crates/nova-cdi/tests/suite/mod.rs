mod fixtures;

mod interception;
mod ordering;
mod processor;
mod resolution;
