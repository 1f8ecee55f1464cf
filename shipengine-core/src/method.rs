use std::fmt;

/// JSON-RPC methods exposed by the ShipEngine API.
///
/// The request builder takes any method string; this enum only names the
/// ones the SDK knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    AddressValidate,
    PackageTrack,
    TagCreate,
    CarrierList,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 4] = [
        RpcMethod::AddressValidate,
        RpcMethod::PackageTrack,
        RpcMethod::TagCreate,
        RpcMethod::CarrierList,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RpcMethod::AddressValidate => "address/validate",
            RpcMethod::PackageTrack => "package/track",
            RpcMethod::TagCreate => "tag/create",
            RpcMethod::CarrierList => "carrier/list",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RpcMethod> for String {
    fn from(method: RpcMethod) -> Self {
        method.as_str().to_string()
    }
}

impl std::str::FromStr for RpcMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RpcMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| format!("Unknown ShipEngine method '{}'", s))
    }
}
