/// Which way a relayed message travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    WhatsappToSlack,
    SlackToWhatsapp,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::WhatsappToSlack => "whatsapp_to_slack",
            Direction::SlackToWhatsapp => "slack_to_whatsapp",
        }
    }
}

/// Labels shared by the span and the counters of one relay request.
#[derive(Debug, Clone)]
pub struct RelayLabels {
    pub direction: Direction,
}

impl RelayLabels {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }

    /// Metric labels. Chat and message ids stay out of metrics to keep cardinality bounded.
    pub fn tags(&self) -> Vec<(&'static str, String)> {
        vec![("direction", self.direction.as_str().to_string())]
    }
}
