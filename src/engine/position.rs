use crate::domain::{
    CommitTime, ConfirmedEvent, Decimal, DistressedStatus, FundingPayment, LossSocialization,
    MarketId, PartyId, PositionCursor, PositionEvent, PositionKey, PositionSettlement,
    SettleDistressed, SettleMarket, Trade, TradeFees, TxHash,
};

use super::checked;
use super::volume::{calculate_open_closed_volume, update_vwap};
use super::InvariantViolation;

/// Volume, average prices and PnL of a position at one point in the settlement cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PositionState {
    /// Net volume: positive = long, negative = short, zero = flat.
    pub open_volume: i64,

    pub realised_pnl: Decimal,

    /// Always zero while flat.
    pub unrealised_pnl: Decimal,

    /// Volume-weighted entry price in settlement-asset scale.
    pub average_entry_price: Decimal,

    /// Volume-weighted entry price in market scale.
    pub average_entry_market_price: Decimal,
}

impl PositionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.open_volume == 0
    }

    pub fn is_long(&self) -> bool {
        self.open_volume > 0
    }

    pub fn is_short(&self) -> bool {
        self.open_volume < 0
    }

    /// Apply one signed fill: realise PnL on the closed part, average in the opened part.
    fn apply_fill(
        &mut self,
        size: i64,
        price: Decimal,
        market_price: Decimal,
        position_factor: Decimal,
    ) -> Result<(), InvariantViolation> {
        let (opened, closed) = calculate_open_closed_volume(self.open_volume, size);

        let realised = checked::pnl(
            closed,
            price,
            self.average_entry_price,
            position_factor,
            "realised_pnl",
        )?;
        self.realised_pnl = checked::add(self.realised_pnl, realised, "realised_pnl")?;
        self.open_volume -= closed;

        self.average_entry_price =
            update_vwap(self.average_entry_price, self.open_volume, opened, price)?;
        self.average_entry_market_price = update_vwap(
            self.average_entry_market_price,
            self.open_volume,
            opened,
            market_price,
        )?;
        self.open_volume = checked::volume(self.open_volume, opened, "open_volume")?;
        Ok(())
    }

    /// Revalue the open volume at `mark_price`.
    fn mark_to_market(
        &mut self,
        mark_price: Decimal,
        position_factor: Decimal,
    ) -> Result<(), InvariantViolation> {
        self.unrealised_pnl = if self.is_flat() {
            Decimal::zero()
        } else {
            checked::pnl(
                self.open_volume,
                mark_price,
                self.average_entry_price,
                position_factor,
                "unrealised_pnl",
            )?
        };
        Ok(())
    }
}

/// Running fee totals for one party in one market.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeeTotals {
    pub maker_fees_received: Decimal,
    pub taker_fees_paid: Decimal,
    /// Infrastructure and liquidity fees.
    pub fees_paid: Decimal,
}

impl FeeTotals {
    fn add(&mut self, fees: &TradeFees) -> Result<(), InvariantViolation> {
        self.maker_fees_received =
            checked::add(self.maker_fees_received, fees.maker, "maker_fees_received")?;
        self.taker_fees_paid = checked::add(self.taker_fees_paid, fees.taker, "taker_fees_paid")?;
        self.fees_paid = checked::add(self.fees_paid, fees.other, "fees_paid")?;
        Ok(())
    }
}

/// Position of one party in one market.
///
/// `confirmed` only moves on authoritative settlement events. `provisional` additionally
/// reflects trades of the current settlement cycle and is overwritten by `confirmed`
/// at the end of every confirmed event.
///
/// A mutator that returns `InvariantViolation` may have partially applied the event;
/// callers keep a copy of the last good position and discard this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub market_id: MarketId,
    pub party_id: PartyId,

    pub confirmed: PositionState,
    pub provisional: PositionState,

    /// What the party lost to loss socialization.
    pub loss: Decimal,
    /// What the party received from loss socialization.
    pub adjustment: Decimal,
    pub loss_socialisation_amount: Decimal,
    pub distressed_status: DistressedStatus,

    /// Fees over the lifetime of the position.
    pub fees: FeeTotals,
    /// Fees since the provisional position last opened or flipped side.
    pub fees_since: FeeTotals,

    pub funding_payment_amount: Decimal,
    /// Funding since the confirmed position last opened or flipped side.
    pub funding_payment_amount_since: Decimal,

    pub tx_hash: TxHash,
    pub commit_time: CommitTime,
}

impl Position {
    /// Empty position for a party first seen in a market.
    pub fn new_empty(market_id: MarketId, party_id: PartyId) -> Self {
        Self {
            market_id,
            party_id,
            confirmed: PositionState::new(),
            provisional: PositionState::new(),
            loss: Decimal::zero(),
            adjustment: Decimal::zero(),
            loss_socialisation_amount: Decimal::zero(),
            distressed_status: DistressedStatus::Unspecified,
            fees: FeeTotals::default(),
            fees_since: FeeTotals::default(),
            funding_payment_amount: Decimal::zero(),
            funding_payment_amount_since: Decimal::zero(),
            tx_hash: TxHash::default(),
            commit_time: CommitTime::epoch(),
        }
    }

    pub fn key(&self) -> PositionKey {
        PositionKey::new(self.market_id.clone(), self.party_id.clone())
    }

    pub fn cursor(&self) -> PositionCursor {
        PositionCursor::new(
            self.market_id.clone(),
            self.party_id.clone(),
            self.commit_time,
        )
    }

    /// Record the commit time of the event being applied.
    pub fn stamp(&mut self, commit_time: CommitTime) {
        self.commit_time = commit_time;
    }

    /// Dispatch an event to its mutator.
    ///
    /// # Errors
    /// Returns `InvariantViolation::Overflow` if the event's arithmetic overflows.
    pub fn apply(&mut self, event: &PositionEvent) -> Result<(), InvariantViolation> {
        match event {
            PositionEvent::Confirmed(confirmed) => match confirmed {
                ConfirmedEvent::PositionSettlement(e) => self.update_with_position_settlement(e),
                ConfirmedEvent::LossSocialization(e) => self.update_with_loss_socialization(e),
                ConfirmedEvent::SettleDistressed(e) => self.update_with_settle_distressed(e),
                ConfirmedEvent::SettleMarket(e) => self.update_with_settle_market(e),
            },
            PositionEvent::Trade {
                trade,
                seller,
                position_factor,
            } => self.update_with_trade(trade, *seller, *position_factor),
            PositionEvent::OrdersClosed => {
                self.update_orders_closed();
                Ok(())
            }
            PositionEvent::DistressedToggle => {
                self.toggle_distressed_status();
                Ok(())
            }
            PositionEvent::FundingPayment(payment) => self.apply_funding_payment(payment),
        }
    }

    /// Provisional update for a trade of the current settlement cycle.
    ///
    /// Only touches the provisional state and fee totals; PnL is marked at the trade's asset price.
    pub fn update_with_trade(
        &mut self,
        trade: &Trade,
        seller: bool,
        position_factor: Decimal,
    ) -> Result<(), InvariantViolation> {
        let size = if seller { -trade.size } else { trade.size };

        self.fees.add(&trade.fees)?;

        let started_flat = self.provisional.is_flat();
        let was_long = self.provisional.is_long();

        self.provisional
            .apply_fill(size, trade.asset_price, trade.price, position_factor)?;

        let flipped = !self.provisional.is_flat() && was_long != self.provisional.is_long();
        if started_flat || flipped {
            self.fees_since = FeeTotals::default();
        }
        if !self.provisional.is_flat() {
            self.fees_since.add(&trade.fees)?;
        }

        self.provisional
            .mark_to_market(trade.asset_price, position_factor)
    }

    /// Authoritative mark-to-market settlement; confirms the cycle's provisional trades.
    pub fn update_with_position_settlement(
        &mut self,
        event: &PositionSettlement,
    ) -> Result<(), InvariantViolation> {
        let position_factor = event.position_factor;
        let mut reset_funding = false;

        for trade in &event.trades {
            if self.confirmed.is_flat() {
                reset_funding = true;
            }
            let was_long = self.confirmed.is_long();

            self.confirmed.apply_fill(
                trade.size,
                trade.price,
                trade.market_price,
                position_factor,
            )?;

            if !self.confirmed.is_flat() && was_long != self.confirmed.is_long() {
                reset_funding = true;
            }
        }

        if reset_funding {
            self.funding_payment_amount_since = Decimal::zero();
        }

        self.confirmed.mark_to_market(event.price, position_factor)?;
        self.tx_hash = event.tx_hash.clone();
        self.sync();
        Ok(())
    }

    pub fn update_with_loss_socialization(
        &mut self,
        event: &LossSocialization,
    ) -> Result<(), InvariantViolation> {
        let amount = event.amount;

        if amount.is_negative() {
            self.loss = checked::sub(self.loss, amount, "loss")?;
            self.loss_socialisation_amount = checked::sub(
                self.loss_socialisation_amount,
                amount,
                "loss_socialisation_amount",
            )?;
        } else {
            self.adjustment = checked::add(self.adjustment, amount, "adjustment")?;
            self.loss_socialisation_amount = checked::add(
                self.loss_socialisation_amount,
                amount,
                "loss_socialisation_amount",
            )?;
        }

        self.confirmed.realised_pnl =
            checked::add(self.confirmed.realised_pnl, amount, "realised_pnl")?;
        self.tx_hash = event.tx_hash.clone();
        self.sync();
        Ok(())
    }

    /// Close out a distressed party: unrealised PnL is realised and the consumed margin is lost.
    pub fn update_with_settle_distressed(
        &mut self,
        event: &SettleDistressed,
    ) -> Result<(), InvariantViolation> {
        let realised = checked::add(
            self.confirmed.realised_pnl,
            self.confirmed.unrealised_pnl,
            "realised_pnl",
        )?;
        self.confirmed.realised_pnl = checked::sub(realised, event.margin, "realised_pnl")?;
        self.confirmed.unrealised_pnl = Decimal::zero();
        self.confirmed.average_entry_price = Decimal::zero();
        self.confirmed.open_volume = 0;

        self.distressed_status = DistressedStatus::ClosedOut;
        self.funding_payment_amount_since = Decimal::zero();
        self.fees_since = FeeTotals::default();

        self.tx_hash = event.tx_hash.clone();
        self.sync();
        Ok(())
    }

    /// Final settlement: remaining open volume is realised at the settled price.
    ///
    /// Leaves `distressed_status` untouched.
    pub fn update_with_settle_market(
        &mut self,
        event: &SettleMarket,
    ) -> Result<(), InvariantViolation> {
        let final_pnl = checked::pnl(
            self.confirmed.open_volume,
            event.settled_price,
            self.confirmed.average_entry_price,
            event.position_factor,
            "realised_pnl",
        )?;

        self.confirmed.realised_pnl =
            checked::add(self.confirmed.realised_pnl, final_pnl, "realised_pnl")?;
        self.confirmed.unrealised_pnl = Decimal::zero();
        self.confirmed.open_volume = 0;

        self.tx_hash = event.tx_hash.clone();
        self.sync();
        Ok(())
    }

    pub fn update_orders_closed(&mut self) {
        if self.distressed_status.is_terminal() {
            return;
        }
        self.distressed_status = DistressedStatus::OrdersClosed;
    }

    /// Distressed <-> Unspecified. OrdersClosed becomes Distressed; ClosedOut never changes.
    pub fn toggle_distressed_status(&mut self) {
        self.distressed_status = match self.distressed_status {
            DistressedStatus::Distressed => DistressedStatus::Unspecified,
            DistressedStatus::ClosedOut => DistressedStatus::ClosedOut,
            DistressedStatus::Unspecified | DistressedStatus::OrdersClosed => {
                DistressedStatus::Distressed
            }
        };
    }

    /// Track a funding payment. PnL is not affected.
    pub fn apply_funding_payment(
        &mut self,
        payment: &FundingPayment,
    ) -> Result<(), InvariantViolation> {
        self.funding_payment_amount = checked::add(
            self.funding_payment_amount,
            payment.amount,
            "funding_payment_amount",
        )?;
        self.funding_payment_amount_since = checked::add(
            self.funding_payment_amount_since,
            payment.amount,
            "funding_payment_amount_since",
        )?;
        Ok(())
    }

    /// Overwrite the provisional state with the confirmed one.
    pub fn sync(&mut self) {
        self.provisional = self.confirmed.clone();
    }

    pub fn is_synced(&self) -> bool {
        self.provisional == self.confirmed
    }

    /// Confirmed average entry price as an unsigned integer.
    ///
    /// # Errors
    /// A negative or out-of-range average is an invariant violation, never clamped.
    pub fn average_entry_price_uint(&self) -> Result<u128, InvariantViolation> {
        price_as_uint("average_entry_price", self.confirmed.average_entry_price)
    }

    /// Provisional market-scale average entry price as an unsigned integer.
    ///
    /// # Errors
    /// A negative or out-of-range average is an invariant violation, never clamped.
    pub fn pending_average_entry_market_price_uint(&self) -> Result<u128, InvariantViolation> {
        price_as_uint(
            "pending_average_entry_market_price",
            self.provisional.average_entry_market_price,
        )
    }
}

fn price_as_uint(field: &'static str, value: Decimal) -> Result<u128, InvariantViolation> {
    value
        .to_u128()
        .ok_or(InvariantViolation::Unrepresentable { field, value })
}
