pub mod decode;
pub mod ports;
pub mod store;
pub mod turn;

#[cfg(test)]
mod tests;
