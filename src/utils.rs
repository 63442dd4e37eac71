//! Utils

use clap::Parser;

/// Arguments for the checkout demo
#[derive(Debug, Parser)]
pub struct DemoCheckoutArgs {
    /// Fixture set to use for the catalog, vouchers & quotes
    #[clap(short, long, default_value = "default")]
    pub fixture: String,

    /// Carrier code to fetch quotes for
    #[clap(short, long, default_value = "jne")]
    pub courier: String,

    /// Voucher code to apply, if any
    #[clap(short, long)]
    pub voucher: Option<String>,

    /// Destination district id
    #[clap(short, long, default_value_t = 1574)]
    pub district: u32,
}
