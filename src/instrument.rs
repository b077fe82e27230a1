// 2.0: static reference data. instruments, sector tags, currency-from-suffix.
// built once at process start into RefData and injected; nothing here is a
// module-level mutable global.

use crate::types::{Currency, Price, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static instrument reference data. Not owned by any game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: Symbol,
    pub name: String,
    pub currency: Currency,
    pub sector: String,
    /// Long-run reference price the simulator mean-reverts toward.
    pub seed_price: Option<Price>,
}

impl Instrument {
    /// Home venue, derived from the symbol suffix.
    pub fn exchange(&self) -> &'static crate::calendar::Exchange {
        crate::calendar::exchange_for_symbol(&self.symbol)
    }
}

/// Instrument currency follows the venue suffix.
pub fn currency_for_symbol(symbol: &Symbol) -> Currency {
    match symbol.suffix() {
        Some(".SW") => Currency::Chf,
        Some(".ST") => Currency::Sek,
        Some(".PA") | Some(".DE") | Some(".AS") | Some(".MC") | Some(".MI") | Some(".HE") => {
            Currency::Eur
        }
        _ => Currency::Usd,
    }
}

// sector ids. every instrument belongs to exactly one; unknown symbols get "other".
pub const SECTOR_IDS: &[&str] = &[
    "tech",
    "finance",
    "health",
    "consumer",
    "industry",
    "energy",
    "luxury",
    "auto",
    "telecom",
    "materials",
    "realestate",
    "insurance",
];

const SYMBOL_SECTORS: &[(&str, &str)] = &[
    // tech
    ("NVDA", "tech"),
    ("TSLA", "tech"),
    ("GOOG", "tech"),
    ("AMD", "tech"),
    ("INTC", "tech"),
    ("CRM", "tech"),
    ("ORCL", "tech"),
    ("ADBE", "tech"),
    ("AVGO", "tech"),
    ("QCOM", "tech"),
    ("SNOW", "tech"),
    ("PLTR", "tech"),
    ("SAP.DE", "tech"),
    ("ASML.AS", "tech"),
    ("TEMN.SW", "tech"),
    ("LOGN.SW", "tech"),
    ("TSM", "tech"),
    ("NFLX", "tech"),
    // telecom
    ("NOKIA.HE", "telecom"),
    ("ERIC-B.ST", "telecom"),
    // finance
    ("JPM", "finance"),
    ("GS", "finance"),
    ("BAC", "finance"),
    ("MS", "finance"),
    ("V", "finance"),
    ("MA", "finance"),
    ("PYPL", "finance"),
    ("UBSG.SW", "finance"),
    ("CSGN.SW", "finance"),
    ("BNP.PA", "finance"),
    ("DBK.DE", "finance"),
    ("BBVA.MC", "finance"),
    ("SAN.MC", "finance"),
    ("HSBC", "finance"),
    ("BRK.B", "finance"),
    // insurance
    ("SREN.SW", "insurance"),
    ("ZURN.SW", "insurance"),
    ("SLHN.SW", "insurance"),
    ("ALV.DE", "insurance"),
    // health
    ("JNJ", "health"),
    ("PFE", "health"),
    ("MRK", "health"),
    ("UNH", "health"),
    ("LLY", "health"),
    ("NOVN.SW", "health"),
    ("ROG.SW", "health"),
    ("ALC.SW", "health"),
    ("SAN.PA", "health"),
    // consumer
    ("KO", "consumer"),
    ("PEP", "consumer"),
    ("MCD", "consumer"),
    ("SBUX", "consumer"),
    ("WMT", "consumer"),
    ("COST", "consumer"),
    ("HD", "consumer"),
    ("LOW", "consumer"),
    ("DIS", "consumer"),
    ("UBER", "consumer"),
    ("NESN.SW", "consumer"),
    ("BARN.SW", "consumer"),
    ("DKSH.SW", "consumer"),
    ("GEBN.SW", "consumer"),
    ("OR.PA", "consumer"),
    // luxury
    ("MC.PA", "luxury"),
    ("RICN.SW", "luxury"),
    ("NKE", "luxury"),
    ("ADS.DE", "luxury"),
    ("RACE", "luxury"),
    // industry
    ("BA", "industry"),
    ("CAT", "industry"),
    ("GE", "industry"),
    ("ABBN.SW", "industry"),
    ("SGSN.SW", "industry"),
    ("SIKA.SW", "industry"),
    ("VATN.SW", "industry"),
    ("AIR.PA", "industry"),
    ("DG.PA", "industry"),
    ("SU.PA", "industry"),
    ("CAP.PA", "industry"),
    ("SIE.DE", "industry"),
    // energy
    ("XOM", "energy"),
    ("CVX", "energy"),
    ("SLB", "energy"),
    ("TTE.PA", "energy"),
    ("RWE.DE", "energy"),
    ("ENI.MI", "energy"),
    // auto
    ("F", "auto"),
    ("GM", "auto"),
    ("VOW3.DE", "auto"),
    ("BMW.DE", "auto"),
    ("DAI.DE", "auto"),
    // materials
    ("BAS.DE", "materials"),
    ("GIVN.SW", "materials"),
    ("CLN.SW", "materials"),
    ("HOLN.SW", "materials"),
    ("LONN.SW", "materials"),
    ("AI.PA", "materials"),
    ("BHP", "materials"),
    // real estate
    ("PSPN.SW", "realestate"),
    ("SPSN.SW", "realestate"),
];

/// Immutable reference data, loaded once and injected into the engine.
#[derive(Debug, Clone)]
pub struct RefData {
    instruments: HashMap<Symbol, Instrument>,
    sectors: HashMap<String, String>,
}

impl RefData {
    pub fn new() -> Self {
        let sectors = SYMBOL_SECTORS
            .iter()
            .map(|(sym, sec)| (sym.to_string(), sec.to_string()))
            .collect();
        Self {
            instruments: HashMap::new(),
            sectors,
        }
    }

    pub fn add_instrument(&mut self, instrument: Instrument) {
        self.instruments.insert(instrument.symbol.clone(), instrument);
    }

    pub fn instrument(&self, symbol: &Symbol) -> Option<&Instrument> {
        self.instruments.get(symbol)
    }

    pub fn instruments_iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.values()
    }

    pub fn seed_price(&self, symbol: &Symbol) -> Option<Price> {
        self.instruments.get(symbol).and_then(|i| i.seed_price)
    }

    /// Sector tag for a symbol. Unknown symbols fall back to "other" so they
    /// still share a drift component with each other.
    pub fn sector_id(&self, symbol: &Symbol) -> &str {
        self.sectors
            .get(symbol.as_str())
            .map(String::as_str)
            .unwrap_or("other")
    }

    pub fn symbols_in_sector(&self, sector: &str) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self
            .sectors
            .iter()
            .filter(|(_, sec)| sec.as_str() == sector)
            .map(|(sym, _)| Symbol::new(sym.clone()))
            .collect();
        symbols.sort();
        symbols
    }
}

impl Default for RefData {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience constructor used by the demo binary and tests.
pub fn instrument(symbol: &str, name: &str, seed_price: Option<Price>) -> Instrument {
    let symbol = Symbol::from(symbol);
    let currency = currency_for_symbol(&symbol);
    let refdata = RefData::new();
    let sector = refdata.sector_id(&symbol).to_string();
    Instrument {
        symbol,
        name: name.to_string(),
        currency,
        sector,
        seed_price,
    }
}
