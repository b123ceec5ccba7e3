//! AMQP event publisher adapter.
//!
//! Publishes to the default exchange with the queue name as the routing key.
//! The queue is declared durable on every publish and messages are marked
//! persistent. Delivery is fire-and-forget: a success means the broker
//! accepted the message for delivery, not that a consumer processed it.
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties,
    options::{BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
};

use crate::ports::publisher::{EventPublisher, PublishError};

pub struct AmqpPublisher {
    channel: Channel,
}

impl AmqpPublisher {
    /// Connect to the broker and open the publishing channel. Failure here
    /// is fatal at startup by design.
    pub async fn connect(broker_url: &str) -> Result<Self> {
        let connection = Connection::connect(broker_url, ConnectionProperties::default())
            .await
            .wrap_err_with(|| format!("failed to connect to message broker at {broker_url}"))?;
        let channel = connection
            .create_channel()
            .await
            .wrap_err("failed to open broker channel")?;
        tracing::info!(broker = broker_url, "connected to message broker");
        Ok(Self { channel })
    }
}

#[async_trait]
impl EventPublisher for AmqpPublisher {
    async fn publish(&self, queue: &str, message: &serde_json::Value) -> Result<(), PublishError> {
        let payload =
            serde_json::to_vec(message).map_err(|e| PublishError::Serialization(e.to_string()))?;

        self.channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| PublishError::Broker(e.to_string()))?;

        self.channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await
            .map_err(|e| PublishError::Broker(e.to_string()))?;

        tracing::debug!(queue, bytes = payload.len(), "message handed to broker");
        Ok(())
    }
}
