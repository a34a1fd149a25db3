pub mod alloy;

use ::alloy::providers::DynProvider;

pub type AlloyProvider = DynProvider;
