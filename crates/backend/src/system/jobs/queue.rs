use once_cell::sync::Lazy;
use std::sync::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Единица работы: сырые байты CSV плюс корреляция (job id, tenant)
#[derive(Debug)]
pub struct ImportJobWorkItem {
    pub job_id: Uuid,
    pub tenant_id: String,
    pub csv_data: Vec<u8>,
}

struct Queue {
    sender: mpsc::UnboundedSender<ImportJobWorkItem>,
    // Receiver забирается ровно один раз — воркером при старте
    receiver: Mutex<Option<mpsc::UnboundedReceiver<ImportJobWorkItem>>>,
}

static QUEUE: Lazy<Queue> = Lazy::new(|| {
    let (sender, receiver) = mpsc::unbounded_channel();
    Queue {
        sender,
        receiver: Mutex::new(Some(receiver)),
    }
});

/// Постановка в очередь не блокируется воркером (очередь неограничена);
/// единственный backpressure-сигнал — память процесса.
pub fn enqueue(item: ImportJobWorkItem) -> anyhow::Result<()> {
    QUEUE
        .sender
        .send(item)
        .map_err(|_| anyhow::anyhow!("import job queue is closed"))
}

/// Забрать receiver; второй вызов вернет None — инвариант единственного
/// консьюмера обеспечен структурно
pub fn take_receiver() -> Option<mpsc::UnboundedReceiver<ImportJobWorkItem>> {
    QUEUE.receiver.lock().unwrap().take()
}
