pub mod bank;
pub mod functions;
pub mod noise;
pub mod oscillators;
pub mod table;
pub mod tables;

pub use bank::LookupTableBank;
pub use noise::GaussianNoise;
pub use oscillators::BandLimitedOscillator;
pub use table::LookupTable;
pub use tables::{TableBankSet, TableCache};
