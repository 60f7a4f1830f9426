use tracing::{debug, info, warn};

use super::environment::{DesktopEnvironment, SourcePlan};
use super::jwm::JwmTraySource;
use super::lxde::LxdeSource;
use super::r#trait::PanelSource;
use super::tint2::Tint2Source;
use super::xfce::XfceSource;
use super::TrayInfo;
use crate::config::{PanelSources, TrayPreference};

pub struct PanelEnvironmentDetector {
    sources: PanelSources,
    preference: TrayPreference,

    // Источники по форматам
    xfce: XfceSource,
    lxde: LxdeSource,
    tint2: Tint2Source,
    jwm: JwmTraySource,
}

impl PanelEnvironmentDetector {
    pub fn new(sources: PanelSources, preference: TrayPreference) -> Self {
        Self {
            xfce: XfceSource::new(sources.xfce_panel.clone()),
            lxde: LxdeSource::new(sources.lxde_panel.clone()),
            tint2: Tint2Source::new(sources.tint2rc.clone()),
            jwm: JwmTraySource::new(sources.jwmrc_tray.clone(), sources.menu_file.clone()),
            sources,
            preference,
        }
    }

    /// Полный проход детекции: окружение по файлу-подсказке, затем цепочка источников
    pub fn detect(&self) -> TrayInfo {
        let environment = DesktopEnvironment::detect(&self.sources.wm_hint);
        info!("Обнаружено оконное окружение: {:?}", environment);
        self.detect_for(environment)
    }

    pub fn detect_for(&self, environment: DesktopEnvironment) -> TrayInfo {
        let plan = environment.source_plan(&self.preference);
        debug!("План источников панели: {:?}", plan);

        for source in self.chain(plan) {
            match source.read_geometry() {
                Ok(geometry) => {
                    let tray = TrayInfo::from_geometry(geometry, source.source());
                    info!("Панель определена: {}", tray);
                    return tray;
                }
                Err(e) if e.is_recoverable() => {
                    debug!("Источник {} не дал результата: {}", source.source(), e);
                }
                Err(e) => {
                    warn!("Источник {} завершился ошибкой: {}", source.source(), e);
                }
            }
        }

        let tray = TrayInfo::default();
        info!("Ни один источник не сработал, используем значения по умолчанию: {}", tray);
        tray
    }

    /// Порядок: XFCE, LXDE, tint2 (если выбраны), затем JWM как последний источник
    fn chain(&self, plan: SourcePlan) -> Vec<&dyn PanelSource> {
        let mut chain: Vec<&dyn PanelSource> = Vec::with_capacity(4);
        if plan.use_xfce {
            chain.push(&self.xfce);
        }
        if plan.use_lxde {
            chain.push(&self.lxde);
        }
        if plan.use_tint2 {
            chain.push(&self.tint2);
        }
        chain.push(&self.jwm);
        chain
    }
}
