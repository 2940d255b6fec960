/// Screen shown in the content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveScreen {
    #[default]
    Alerts,
    Drivers,
    Notifications,
}

impl ActiveScreen {
    pub const ALL: &[Self] = &[Self::Alerts, Self::Drivers, Self::Notifications];

    pub fn label(self) -> &'static str {
        match self {
            Self::Alerts => "Alerts",
            Self::Drivers => "Drivers",
            Self::Notifications => "Notifications",
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Self::Alerts => 1,
            Self::Drivers => 2,
            Self::Notifications => 3,
        }
    }

    pub fn from_number_key(ch: char) -> Option<Self> {
        match ch {
            '1' => Some(Self::Alerts),
            '2' => Some(Self::Drivers),
            '3' => Some(Self::Notifications),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Alerts => Self::Drivers,
            Self::Drivers => Self::Notifications,
            Self::Notifications => Self::Alerts,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Alerts => Self::Notifications,
            Self::Drivers => Self::Alerts,
            Self::Notifications => Self::Drivers,
        }
    }
}
