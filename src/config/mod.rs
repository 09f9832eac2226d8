mod settings;

pub use settings::{
    Command, Config, GatewaySettings, MockSettings, PairingSettings, PhoneSettings,
    ServerSettings, Settings,
};
