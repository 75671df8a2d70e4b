pub mod eip;
pub mod nat;
pub mod slb;

use crate::domain::DomainSpec;

pub static ALL: [&DomainSpec; 3] = [&slb::SLB, &nat::NAT, &eip::EIP];

pub fn lookup(key: &str) -> Option<&'static DomainSpec> {
    ALL.iter()
        .copied()
        .find(|domain| domain.key.eq_ignore_ascii_case(key.trim()))
}
