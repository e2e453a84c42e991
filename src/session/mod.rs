pub mod answer;
pub mod result;
