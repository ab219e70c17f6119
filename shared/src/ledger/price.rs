//! Running price statistics

use chrono::{Datelike, NaiveDate};

use crate::models::{PriceBucket, PriceInfo, Product};

/// Round half up on cents: `floor(x * 100 + 0.5) / 100`
pub fn round2(x: f64) -> f64 {
    (x * 100.0 + 0.5).floor() / 100.0
}

impl PriceInfo {
    /// Fold one observed price into the statistics
    ///
    /// `average` is a two-point decaying average of the previous average and the new
    /// price, not a mean over all observations. Zero in `min` and `average` means unset.
    pub fn observe(&mut self, new_price: f64, on: NaiveDate) {
        let year = on.year();
        let month = on.month();

        self.latest = new_price;

        if self.min == 0.0 || new_price < self.min {
            self.min = new_price;
        }

        if new_price > self.max {
            self.max = new_price;
        }

        if self.average == 0.0 {
            self.average = new_price;
        } else {
            self.average = round2((self.average + new_price) / 2.0);
        }

        if self.ytd_year != year {
            self.ytd_year = year;
            self.ytd_count = 1;
            self.ytd_total = new_price;
            self.average_ytd = new_price;
        } else {
            self.ytd_count += 1;
            self.ytd_total += new_price;
            self.average_ytd = round2(self.ytd_total / f64::from(self.ytd_count));
        }

        if self.mtd_year != year || self.mtd_month != month {
            self.mtd_year = year;
            self.mtd_month = month;
            self.mtd_count = 1;
            self.mtd_total = new_price;
            self.average_mtd = new_price;
        } else {
            self.mtd_count += 1;
            self.mtd_total += new_price;
            self.average_mtd = round2(self.mtd_total / f64::from(self.mtd_count));
        }
    }
}

/// Record a purchase or sale price on the matching bucket of `product`
///
/// Only the bucket selected by `(is_purchase, is_vat)` changes.
pub fn update_price(
    product: &mut Product,
    new_price: f64,
    is_vat: bool,
    is_purchase: bool,
    on: NaiveDate,
) {
    product
        .price
        .bucket_mut(PriceBucket::select(is_purchase, is_vat))
        .observe(new_price, on);
}
