use axum::{extract::State, response::Html};
use chrono::Utc;
use pulldown_cmark::{html, Options, Parser};

use crate::{
    models::news::{NewsItem, TITLE_COLORS},
    services::{expansion::ExpansionState, visibility::visible_on},
    AppState,
};

const CLINIC_NAME: &str = "リハビリ整形外科みなみクリニック";

const CSS: &str = r#"
body { margin: 0; font-family: "Hiragino Kaku Gothic ProN", "Noto Sans JP", sans-serif; color: #1f2937; }
header { background: #15803d; color: #fff; padding: 14px 20px; }
header a { color: #fff; text-decoration: none; }
header nav a { margin-left: 16px; font-size: 14px; }
main { max-width: 880px; margin: 0 auto; padding: 32px 16px; }
h1 { font-size: 26px; text-align: center; }
h2 { color: #15803d; border-bottom: 2px solid #16a34a; padding-bottom: 6px; }
table.hours { width: 100%; border-collapse: collapse; }
table.hours th, table.hours td { border: 1px solid #d1d5db; padding: 8px; text-align: center; }
.news-item { background: #f9fafb; border: 1px solid #f3f4f6; border-radius: 8px; margin: 10px 0; }
.news-item summary { cursor: pointer; padding: 14px 18px; }
.news-date { color: #6b7280; font-size: 13px; margin-right: 14px; }
.news-title { font-weight: 700; }
.news-body { padding: 0 18px 14px; }
.empty { color: #6b7280; text-align: center; }
footer { background: #f3f4f6; color: #6b7280; text-align: center; padding: 18px; font-size: 13px; margin-top: 40px; }
"#;

fn esc(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>{title}</title>
<style>{css}</style>
</head>
<body>
<header>
  <a href="/"><strong>{clinic}</strong></a>
  <nav style="display:inline-block;float:right">
    <a href="/">ホーム</a>
    <a href="/about">クリニック紹介</a>
    <a href="/treatment">診療内容</a>
    <a href="/first-visit">初めての方へ</a>
  </nav>
</header>
<main>
{body}
</main>
<footer>&copy; {clinic}</footer>
</body>
</html>"#,
        title = esc(title),
        css = CSS,
        clinic = CLINIC_NAME,
        body = body,
    ))
}

/// Markdown → HTML for announcement bodies. Raw HTML blocks and inline tags
/// pass through untouched, so HTML-authored announcements render unchanged.
fn render_content(content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(content, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// The home-page news widget: one `<details>` per visible item, with the
/// initial open set seeded from `defaultExpanded`. Toggling afterwards is
/// the browser's own `<details>` behavior — no server round trip.
fn news_section(visible: &[NewsItem], expansion: &ExpansionState) -> String {
    if visible.is_empty() {
        return r#"<p class="empty">お知らせはありません</p>"#.to_string();
    }
    visible
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let open = if expansion.is_open(index) { " open" } else { "" };
            let color = item.title_color.as_deref().unwrap_or("#111827");
            format!(
                r#"<details class="news-item"{open}>
  <summary><span class="news-date">{date}</span><span class="news-title" style="color:{color}">{title}</span></summary>
  <div class="news-body">{content}</div>
</details>"#,
                open = open,
                date = item.date.format("%Y.%m.%d"),
                color = esc(color),
                title = esc(&item.title),
                content = render_content(&item.content),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// GET /
pub async fn home(State(state): State<AppState>) -> Html<String> {
    let items = state.cache.get_or_fetch(state.store.as_ref()).await;
    let visible = visible_on(items, Utc::now().date_naive());
    let mut expansion = ExpansionState::new();
    expansion.seed(&visible);

    let body = format!(
        r#"<h1>{clinic}</h1>
<p style="text-align:center">肩・腰・ひざの痛み、スポーツ外傷、リハビリテーションのご相談は当院へ。</p>

<h2>お知らせ</h2>
{news}

<h2>診療時間</h2>
<table class="hours">
  <tr><th>受付時間</th><th>月</th><th>火</th><th>水</th><th>木</th><th>金</th><th>土</th><th>日・祝</th></tr>
  <tr><td>9:00〜12:30</td><td>○</td><td>○</td><td>○</td><td>／</td><td>○</td><td>○</td><td>／</td></tr>
  <tr><td>14:30〜18:00</td><td>○</td><td>○</td><td>○</td><td>／</td><td>○</td><td>／</td><td>／</td></tr>
</table>
<p>休診日：木曜・土曜午後・日曜・祝日</p>

<h2>アクセス</h2>
<p>最寄り駅から徒歩5分。駐車場あり。詳しくは<a href="/first-visit">初めての方へ</a>をご覧ください。</p>"#,
        clinic = CLINIC_NAME,
        news = news_section(&visible, &expansion),
    );
    layout(CLINIC_NAME, &body)
}

/// GET /about
pub async fn about() -> Html<String> {
    layout(
        "クリニック紹介",
        r#"<h1>クリニック紹介</h1>

<h2>院長挨拶</h2>
<p>当院のホームページをご覧いただきありがとうございます。</p>
<p>地域の皆様の「痛み」や「動きにくさ」といったお悩みに寄り添い、お一人おひとりに合った治療を提供することを心がけております。何かお困りのことがございましたら、お気軽にご相談ください。</p>

<h2>クリニック情報</h2>
<table class="hours">
  <tr><th>医院名</th><td>リハビリ整形外科みなみクリニック</td></tr>
  <tr><th>診療科目</th><td>整形外科・リハビリテーション科</td></tr>
  <tr><th>院長</th><td>南 龍野</td></tr>
</table>"#,
    )
}

/// GET /treatment
pub async fn treatment() -> Html<String> {
    layout(
        "診療内容",
        r#"<h1>診療内容</h1>

<h2>整形外科</h2>
<p>肩こり・腰痛・関節痛・骨折・捻挫・スポーツ外傷など、骨・関節・筋肉に関わる症状を診療します。</p>

<h2>リハビリテーション</h2>
<p>理学療法士による運動器リハビリテーションを行っています。症状や生活に合わせたプログラムを作成し、回復と再発予防をサポートします。</p>

<h2>物理療法</h2>
<p>温熱療法・電気治療・牽引療法などの物理療法機器を備えています。</p>"#,
    )
}

/// GET /first-visit
pub async fn first_visit() -> Html<String> {
    layout(
        "初めての方へ",
        r#"<h1>初めての方へ</h1>

<h2>受診の流れ</h2>
<ol>
  <li>受付にて保険証をご提示ください。</li>
  <li>問診票にご記入いただきます。</li>
  <li>診察・必要に応じて検査を行います。</li>
  <li>治療方針をご説明し、リハビリ等をご案内します。</li>
</ol>

<h2>お持ちいただくもの</h2>
<ul>
  <li>保険証（マイナンバーカード）</li>
  <li>お薬手帳（お持ちの方）</li>
  <li>他院からの紹介状・画像（お持ちの方）</li>
</ul>

<h2>アクセス</h2>
<p>最寄り駅から徒歩5分。専用駐車場をご利用いただけます。</p>"#,
    )
}

const ADMIN_JS: &str = r##"
const $ = (id) => document.getElementById(id);
let editingId = null;
let busy = false;

async function api(path, method, body) {
  const res = await fetch(path, {
    method,
    headers: body ? { "Content-Type": "application/json" } : undefined,
    body: body ? JSON.stringify(body) : undefined,
  });
  const json = await res.json().catch(() => ({}));
  return { status: res.status, json };
}

function show(view) {
  $("login-view").hidden = view !== "login";
  $("admin-view").hidden = view !== "admin";
}

function sessionExpired(json) {
  alert(json.error || "セッションの有効期限が切れました");
  show("login");
}

function resetForm() {
  editingId = null;
  $("f-date").value = new Date().toISOString().split("T")[0];
  $("f-title").value = "";
  $("f-start").value = "";
  $("f-end").value = "";
  $("f-expanded").checked = false;
  $("f-content").value = "";
  document.querySelector('input[name="f-color"][value=""]').checked = true;
  $("form-title").textContent = "新規お知らせ";
  $("form-box").hidden = true;
}

function formPayload() {
  return {
    date: $("f-date").value,
    title: $("f-title").value,
    titleColor: document.querySelector('input[name="f-color"]:checked').value,
    content: $("f-content").value,
    startDate: $("f-start").value,
    endDate: $("f-end").value,
    defaultExpanded: $("f-expanded").checked,
  };
}

function renderList(items) {
  const box = $("news-list");
  box.innerHTML = "";
  if (!items.length) {
    box.innerHTML = '<p class="empty">お知らせはありません</p>';
    return;
  }
  for (const item of items) {
    const row = document.createElement("div");
    row.className = "admin-row";
    const head = document.createElement("div");
    const date = document.createElement("span");
    date.className = "news-date";
    date.textContent = item.date.replaceAll("-", ".");
    const title = document.createElement("span");
    title.className = "news-title";
    title.style.color = item.titleColor || "inherit";
    title.textContent = item.title;
    head.append(date, title);
    if (item.startDate || item.endDate) {
      const window_ = document.createElement("span");
      window_.className = "window";
      window_.textContent =
        " 掲載: " + (item.startDate || "開始日なし") + " 〜 " + (item.endDate || "終了日なし");
      head.append(window_);
    }
    const actions = document.createElement("div");
    const edit = document.createElement("button");
    edit.textContent = "編集";
    edit.onclick = () => startEdit(item);
    const del = document.createElement("button");
    del.textContent = "削除";
    if (!item.id) {
      del.disabled = true;
      del.title = "IDのない行は削除できません";
      edit.disabled = true;
    } else {
      del.onclick = () => remove(item.id, del);
    }
    actions.append(edit, del);
    row.append(head, actions);
    box.append(row);
  }
}

function startEdit(item) {
  editingId = item.id;
  $("f-date").value = item.date;
  $("f-title").value = item.title;
  $("f-start").value = item.startDate || "";
  $("f-end").value = item.endDate || "";
  $("f-expanded").checked = !!item.defaultExpanded;
  $("f-content").value = item.content || "";
  const color = document.querySelector('input[name="f-color"][value="' + (item.titleColor || "") + '"]');
  if (color) color.checked = true;
  $("form-title").textContent = "お知らせを編集";
  $("form-box").hidden = false;
}

async function refresh() {
  const { status, json } = await api("/admin/api/news", "GET");
  if (status === 401) { show("login"); return; }
  if (status !== 200) { alert(json.error || "お知らせの取得に失敗しました"); return; }
  show("admin");
  renderList(json);
}

async function save() {
  if (busy) return;
  const payload = formPayload();
  if (!payload.title.trim()) {
    alert("タイトルを入力してください");
    return;
  }
  busy = true;
  $("save-btn").disabled = true;
  try {
    const { status, json } = editingId
      ? await api("/admin/api/news/" + encodeURIComponent(editingId), "PUT", payload)
      : await api("/admin/api/news", "POST", payload);
    if (status === 401) { sessionExpired(json); return; }
    if (status !== 200) { alert(json.error || "保存に失敗しました"); return; }
    resetForm();
    await refresh();
  } finally {
    busy = false;
    $("save-btn").disabled = false;
  }
}

async function remove(id, button) {
  if (busy) return;
  if (!confirm("このお知らせを削除しますか？")) return;
  busy = true;
  button.disabled = true;
  try {
    const { status, json } = await api("/admin/api/news/" + encodeURIComponent(id), "DELETE");
    if (status === 401) { sessionExpired(json); return; }
    if (status !== 200) { alert(json.error || "削除に失敗しました"); return; }
    await refresh();
  } finally {
    busy = false;
    button.disabled = false;
  }
}

async function login(event) {
  event.preventDefault();
  const password = $("password").value;
  $("login-error").textContent = "";
  if (!password.trim()) {
    $("login-error").textContent = "パスワードを入力してください";
    return;
  }
  $("login-btn").disabled = true;
  try {
    const { status, json } = await api("/admin/api/login", "POST", { password });
    if (status !== 200) {
      $("login-error").textContent = json.error || "ログインに失敗しました";
      return;
    }
    $("password").value = "";
    await refresh();
  } finally {
    $("login-btn").disabled = false;
  }
}

async function logout() {
  await api("/admin/api/logout", "POST");
  show("login");
}

$("login-form").addEventListener("submit", login);
$("logout-btn").onclick = logout;
$("new-btn").onclick = () => { resetForm(); $("form-box").hidden = false; };
$("cancel-btn").onclick = resetForm;
$("save-btn").onclick = save;
resetForm();
refresh();
"##;

/// GET /admin — login gate plus the management UI; all data flows through
/// the admin API.
pub async fn admin() -> Html<String> {
    let palette = std::iter::once(String::from(
        r#"<label><input type="radio" name="f-color" value="" checked> 黒（デフォルト）</label>"#,
    ))
    .chain(TITLE_COLORS.iter().map(|color| {
        format!(
            r#"<label style="color:{color}"><input type="radio" name="f-color" value="{color}"> ■</label>"#
        )
    }))
    .collect::<Vec<_>>()
    .join("\n      ");

    let body = format!(
        r#"<div id="login-view" hidden>
  <h1>管理者ログイン</h1>
  <form id="login-form">
    <label>パスワード <input type="password" id="password" autofocus></label>
    <p id="login-error" style="color:#dc2626"></p>
    <button type="submit" id="login-btn">ログイン</button>
  </form>
  <p><a href="/">サイトに戻る</a></p>
</div>

<div id="admin-view" hidden>
  <h1>お知らせ管理</h1>
  <p><a href="/">サイトに戻る</a> <button id="logout-btn">ログアウト</button></p>
  <button id="new-btn">新規作成</button>

  <div id="form-box" hidden>
    <h2 id="form-title">新規お知らせ</h2>
    <p><label>日付 <input type="date" id="f-date"></label></p>
    <p><label>タイトル <input type="text" id="f-title" placeholder="お知らせのタイトル"></label></p>
    <p>文字色:
      {palette}
    </p>
    <p>掲載期間（任意）
      <input type="date" id="f-start"> 〜 <input type="date" id="f-end">
      <small>未設定の場合は常に表示されます</small>
    </p>
    <p><label><input type="checkbox" id="f-expanded"> 初期状態で展開する</label></p>
    <p><label>内容（Markdown または HTML）<br>
      <textarea id="f-content" rows="12" style="width:100%"></textarea></label></p>
    <button id="save-btn">保存</button>
    <button id="cancel-btn">キャンセル</button>
  </div>

  <h2>お知らせ一覧</h2>
  <div id="news-list"></div>
</div>

<script>{js}</script>"#,
        palette = palette,
        js = ADMIN_JS,
    );
    layout("お知らせ管理", &body)
}
