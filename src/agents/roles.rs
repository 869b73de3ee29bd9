//! Builders for the concrete agent roles
//!
//! Every role is a [`RuntimeAgent`] over the shared runtime and registry;
//! roles differ only in instruction and tool set. The report agent's slot
//! index is a constructor parameter.

use std::sync::Arc;

use super::agent::{ChatAgent, RuntimeAgent};
use super::registry::ConversationRegistry;
use super::runtime::{AgentProfile, AgentRuntime};
use super::tools::{
    AddressPinTool, HazardInfoTool, NearbyBuildingsTool, ReachableStationsTool, StationPinTool,
    WebSearchTool,
};
use crate::chat::{AgentSet, PinStore};
use crate::domain::{GeocodePort, HazardPort, PlacesPort, SearchPort, TransitPort};

/// Shared collaborators the role builders draw from.
pub struct AgentDeps {
    pub runtime: Arc<dyn AgentRuntime>,
    pub registry: Arc<ConversationRegistry>,
    pub pins: Arc<PinStore>,
    pub geocode: Arc<dyn GeocodePort>,
    pub transit: Arc<dyn TransitPort>,
    pub search: Arc<dyn SearchPort>,
    pub places: Arc<dyn PlacesPort>,
    pub hazard: Arc<dyn HazardPort>,
}

impl AgentDeps {
    fn agent(&self, profile: AgentProfile) -> Arc<dyn ChatAgent> {
        Arc::new(RuntimeAgent::new(
            profile,
            self.runtime.clone(),
            self.registry.clone(),
        ))
    }
}

/// Pins the workplace station named in the user's first message.
pub fn station_agent(deps: &AgentDeps) -> Arc<dyn ChatAgent> {
    deps.agent(AgentProfile {
        name: "station_agent".to_string(),
        instruction: "\
ユーザーのメッセージから通勤先の駅を特定し、必ず get_station_coordinates を呼び出して\
地図にピンを表示してください。成功したら、駅の位置を左側の地図に表示したことを伝え、\
続いてその駅から到達可能な駅を探すので少々待つよう、丁寧な日本語で案内してください。"
            .to_string(),
        tools: vec![Arc::new(StationPinTool::new(
            deps.geocode.clone(),
            deps.pins.clone(),
        ))],
    })
}

/// Recommends up to three stations to live near, with travel time and rent.
pub fn suggest_agent(deps: &AgentDeps) -> Arc<dyn ChatAgent> {
    deps.agent(AgentProfile {
        name: "suggest_agent".to_string(),
        instruction: "\
ユーザーの通勤条件をもとに、住むのに適した駅の候補を最大3件挙げてください。\
まず reachable_station を呼び出し、失敗した場合は web_search で調べてください。\
各候補について駅名・所要時間・ワンルームの家賃相場を番号付きで示し、\
続けてそれぞれの駅を詳しく説明するので少々待つよう案内してください。\
いずれの調査も失敗した場合は、依頼文面を変えて再度依頼するようお願いしてください。"
            .to_string(),
        tools: vec![
            Arc::new(ReachableStationsTool::new(deps.transit.clone())),
            Arc::new(WebSearchTool::new(deps.search.clone())),
        ],
    })
}

/// Pins each station named in the suggestion reply.
pub fn multi_pin_station_agent(deps: &AgentDeps) -> Arc<dyn ChatAgent> {
    deps.agent(AgentProfile {
        name: "multi_pin_station_agent".to_string(),
        instruction: "\
入力に含まれる駅（最大3つ）について、駅ごとに1回ずつ get_station_coordinates を\
呼び出して地図にピンを表示してください。成功したらピンを表示したことを伝え、\
各駅の特徴をまとめるので少々待つよう案内してください。\
すべて失敗した場合は、追加の情報をまとめる旨だけを伝えてください。"
            .to_string(),
        tools: vec![Arc::new(StationPinTool::new(
            deps.geocode.clone(),
            deps.pins.clone(),
        ))],
    })
}

/// Reports on the `slot`-th (1-based) station of the input, or emits the
/// no-report marker when that slot does not exist.
pub fn report_agent(deps: &AgentDeps, slot: usize) -> Arc<dyn ChatAgent> {
    deps.agent(AgentProfile {
        name: format!("report_agent_{slot}"),
        instruction: format!(
            "\
入力にある{slot}番目の駅について web_search で調査し、周辺環境・住宅環境・\
おすすめポイントをそれぞれ数行ずつ、丁寧な日本語で報告してください。\
{slot}番目の駅が入力に存在しない場合は「出力無」とだけ記載してください。\
検索に失敗した場合は、時間をおいて再度試すようお願いしてください。"
        ),
        tools: vec![Arc::new(WebSearchTool::new(deps.search.clone()))],
    })
}

/// Closes the first turn by inviting a follow-up question.
pub fn followup_agent(deps: &AgentDeps) -> Arc<dyn ChatAgent> {
    deps.agent(AgentProfile {
        name: "followup_agent".to_string(),
        instruction: "\
入力に含まれる駅名を踏まえ、追加で調査できる内容の例（周辺の学校や病院、\
不動産会社、これまでの会話のまとめやアドバイスなど）を番号付きで示し、\
他に知りたいことがないか尋ねてください。".to_string(),
        tools: vec![],
    })
}

/// General-purpose concierge for established conversations.
pub fn general_agent(deps: &AgentDeps) -> Arc<dyn ChatAgent> {
    deps.agent(AgentProfile {
        name: "estate_agent".to_string(),
        instruction: "\
あなたは不動産提案のコンシェルジュです。駅周辺情報や不動産に関する質問に、\
丁寧な敬語で回答してください。場所の話題では get_latlon_from_address で地図に\
ピンを表示し、周辺施設は get_nearby_buildings、災害リスクは check_hazard_info、\
その他の調査は web_search を使ってください。目的と異なる依頼には応じず、\
依頼内容を変えてもらうようお願いしてください。"
            .to_string(),
        tools: vec![
            Arc::new(AddressPinTool::new(deps.geocode.clone(), deps.pins.clone())),
            Arc::new(NearbyBuildingsTool::new(deps.places.clone())),
            Arc::new(HazardInfoTool::new(deps.hazard.clone())),
            Arc::new(WebSearchTool::new(deps.search.clone())),
        ],
    })
}

/// Builds the full agent set for the pipeline, with `report_slots` report
/// agents in slot order.
pub fn build_agent_set(deps: &AgentDeps, report_slots: usize) -> AgentSet {
    AgentSet {
        locate: station_agent(deps),
        suggest: suggest_agent(deps),
        pin_suggestions: multi_pin_station_agent(deps),
        reports: (1..=report_slots).map(|i| report_agent(deps, i)).collect(),
        followup: followup_agent(deps),
        general: general_agent(deps),
    }
}
