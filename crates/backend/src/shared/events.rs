use contracts::usecases::u501_import_waybills::WaybillsImportedEvent;
use once_cell::sync::Lazy;
use tokio::sync::broadcast;

/// Единственный топик деплоймента: факты о завершенных импортах.
///
/// Доставка at-least-once (канал broadcast, медленный подписчик может
/// получить Lagged и перечитать хвост); консьюмеры обязаны быть идемпотентными.
const TOPIC_CAPACITY: usize = 256;

static TOPIC: Lazy<broadcast::Sender<WaybillsImportedEvent>> =
    Lazy::new(|| broadcast::channel(TOPIC_CAPACITY).0);

/// Публикация факта импорта. Событие — часть контракта операции, поэтому
/// отсутствие живых подписчиков поднимается как ошибка, а не глотается.
pub fn publish_waybills_imported(event: WaybillsImportedEvent) -> anyhow::Result<()> {
    match TOPIC.send(event) {
        Ok(receivers) => {
            tracing::info!("Published waybills-imported event to {} subscriber(s)", receivers);
            Ok(())
        }
        Err(broadcast::error::SendError(event)) => {
            tracing::error!(
                "Failed to publish waybills-imported event Tenant={} JobId={}: no subscribers",
                event.tenant_id,
                event.import_job_id
            );
            Err(anyhow::anyhow!(
                "waybills-imported publish failed: no live subscribers"
            ))
        }
    }
}

pub fn subscribe() -> broadcast::Receiver<WaybillsImportedEvent> {
    TOPIC.subscribe()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_event() -> WaybillsImportedEvent {
        WaybillsImportedEvent {
            tenant_id: "t1".into(),
            import_job_id: Uuid::new_v4(),
            total_rows: 1,
            inserted_count: 1,
            updated_count: 0,
            rejected_count: 0,
            occurred_at: Utc::now(),
        }
    }

    // Один тест: этапы завязаны на общий статический топик
    #[tokio::test]
    async fn publish_requires_a_live_subscriber() {
        assert!(publish_waybills_imported(sample_event()).is_err());

        let mut rx = subscribe();
        let event = sample_event();
        publish_waybills_imported(event.clone()).unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.import_job_id, event.import_job_id);
    }
}
