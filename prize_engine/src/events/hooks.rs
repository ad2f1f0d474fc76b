use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, PrizeWonEvent, VoucherIssuedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub prize_won_producer: Vec<EventProducer<PrizeWonEvent>>,
    pub voucher_issued_producer: Vec<EventProducer<VoucherIssuedEvent>>,
}

pub struct EventHandlers {
    pub on_prize_won: Option<EventHandler<PrizeWonEvent>>,
    pub on_voucher_issued: Option<EventHandler<VoucherIssuedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_prize_won = hooks.on_prize_won.map(|f| EventHandler::new(buffer_size, f));
        let on_voucher_issued = hooks.on_voucher_issued.map(|f| EventHandler::new(buffer_size, f));
        Self { on_prize_won, on_voucher_issued }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_prize_won {
            result.prize_won_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_voucher_issued {
            result.voucher_issued_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_prize_won {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_voucher_issued {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_prize_won: Option<Handler<PrizeWonEvent>>,
    pub on_voucher_issued: Option<Handler<VoucherIssuedEvent>>,
}

impl EventHooks {
    pub fn on_prize_won<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PrizeWonEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_prize_won = Some(Arc::new(f));
        self
    }

    pub fn on_voucher_issued<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(VoucherIssuedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_voucher_issued = Some(Arc::new(f));
        self
    }
}
