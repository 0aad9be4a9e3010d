//! Model to entity mappers

mod message;
