/// A Kafka message as seen by the shim
///
/// The shim only reads `topic` and replaces `value`; the remaining fields are
/// carried through untouched for the client wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Kafka topic
    pub topic: String,
    /// Kafka partition (`None` lets the producer pick one)
    pub partition: Option<i32>,
    /// Kafka offset, set on consumed messages
    pub offset: Option<i64>,
    /// Message key (if any)
    pub key: Option<Vec<u8>>,
    /// Message payload
    pub value: Vec<u8>,
    /// Message timestamp (milliseconds since epoch)
    pub timestamp: Option<i64>,
}

impl Message {
    pub fn new(topic: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_partition(mut self, partition: i32) -> Self {
        self.partition = Some(partition);
        self
    }
}
