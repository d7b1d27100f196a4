//! Parser module for C# test files

pub mod csharp;

pub use csharp::CSharpParser;
