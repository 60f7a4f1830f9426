use crate::error::Result;

use super::{PanelGeometry, TraySource};

/// Один источник сведений о панели (файл конфигурации конкретного формата)
pub trait PanelSource {
    /// Какой `TraySource` выставляется при успешном разборе
    fn source(&self) -> TraySource;

    /// Разобрать источник. Любая ошибка означает "этот шаг не дал результата".
    fn read_geometry(&self) -> Result<PanelGeometry>;
}
